//! Telemetry publisher boundary and its MQTT implementation

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use rumqttc::v5 as mqtt5;
use rumqttc::Transport;

use crate::config::AgentConfig;

/// Capability: deliver one payload to a topic at the given QoS, or fail
pub trait TelemetryPublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: String, qos: u8) -> impl Future<Output = Result<()>> + Send;
}

pub fn qos(v: u8) -> mqtt5::mqttbytes::QoS {
    match v {
        0 => mqtt5::mqttbytes::QoS::AtMostOnce,
        _ => mqtt5::mqttbytes::QoS::AtLeastOnce,
    }
}

pub fn build_options(config: &AgentConfig) -> Result<mqtt5::MqttOptions> {
    let mut opts = mqtt5::MqttOptions::new(config.thing_name.clone(), config.endpoint.clone(), config.port);
    opts.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    opts.set_clean_start(true);

    match (&config.ca_file, &config.cert_file, &config.key_file) {
        (Some(ca), cert, key) => {
            let ca = fs::read(ca).with_context(|| format!("failed to read CA file {}", ca.display()))?;
            let client_auth = match (cert, key) {
                (Some(cert), Some(key)) => Some((
                    fs::read(cert).with_context(|| format!("failed to read certificate {}", cert.display()))?,
                    fs::read(key).with_context(|| format!("failed to read private key {}", key.display()))?,
                )),
                _ => None,
            };
            opts.set_transport(Transport::tls(ca, client_auth, None));
        }
        (None, Some(_), _) => {
            return Err(anyhow!("cert_file requires ca_file for mutual TLS"));
        }
        (None, None, _) if config.port == 8883 => {
            opts.set_transport(Transport::tls_with_default_config());
        }
        _ => {}
    }

    Ok(opts)
}

/// Outgoing requests buffered while the broker is unreachable
pub const REQUEST_QUEUE_CAP: usize = 50;

/// MQTT v5 publisher; the event loop runs on its own task
///
/// `publish` never waits on the broker: a payload is queued for the event
/// loop, or rejected at once when the queue is full.
pub struct MqttPublisher {
    client: mqtt5::AsyncClient,
}

impl MqttPublisher {
    /// Must be called from within a tokio runtime
    pub fn connect(config: &AgentConfig) -> Result<Self> {
        let opts = build_options(config)?;
        let (client, mut eventloop) = mqtt5::AsyncClient::new(opts, REQUEST_QUEUE_CAP);

        info!(endpoint = %config.endpoint, port = config.port, client_id = %config.thing_name, "Starting MQTT session");

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(mqtt5::Event::Incoming(mqtt5::Incoming::ConnAck(_))) => {
                        info!("MQTT connected");
                    }
                    Ok(event) => debug!(?event, "MQTT event"),
                    Err(e) => {
                        warn!(error = %e, "MQTT connection error; reconnecting after short delay");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });

        Ok(Self { client })
    }

    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "MQTT disconnect failed");
        }
    }
}

impl TelemetryPublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: String, qos_level: u8) -> Result<()> {
        self.client
            .try_publish(topic.to_string(), qos(qos_level), false, payload)
            .map_err(|e| anyhow!("MQTT publish to {} failed: {}", topic, e))
    }
}
