//! Device agent loop
//!
//! Two independent timers share one publisher: the sample timer publishes on
//! state changes, the heartbeat timer publishes a liveness message carrying
//! the real state. `tokio::select!` polls both without bias so neither can
//! starve the other.

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use super::clock::Clock;
use super::payload::{PayloadBuilder, StatusPayload, REASON_EVENT_CHANGE, REASON_HEARTBEAT, REASON_STARTUP};
use super::publisher::TelemetryPublisher;
use super::sampler::DeviceStateSampler;
use super::status::DeviceStatus;
use crate::config::AgentConfig;

/// Static settings of one agent instance
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub device_id: String,
    pub location: String,
    pub topic: String,
    pub qos: u8,
    pub sample_interval: Duration,
    pub heartbeat_interval: Duration,
}

impl From<&AgentConfig> for AgentSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            device_id: config.thing_name.clone(),
            location: config.location.clone(),
            topic: config.topic.clone(),
            qos: config.qos,
            sample_interval: config.sample_interval(),
            heartbeat_interval: config.heartbeat_interval(),
        }
    }
}

pub struct MonitorAgent<P> {
    settings: AgentSettings,
    sampler: DeviceStateSampler,
    publisher: P,
    clock: Arc<dyn Clock>,
    last_status: Option<DeviceStatus>,
}

impl<P: TelemetryPublisher> MonitorAgent<P> {
    pub fn new(settings: AgentSettings, sampler: DeviceStateSampler, publisher: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            sampler,
            publisher,
            clock,
            last_status: None,
        }
    }

    pub fn last_status(&self) -> Option<DeviceStatus> {
        self.last_status
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Sample once; publish when the state changed (or on the first sample)
    ///
    /// Returns the payload that was handed to the publisher, if any.
    pub async fn on_sample_tick(&mut self) -> Option<StatusPayload> {
        let status = match self.sampler.sample() {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Failed to sample pump state; skipping cycle");
                return None;
            }
        };

        let reason = match self.last_status {
            None => REASON_STARTUP,
            Some(prev) if prev != status => {
                info!(from = %prev, to = %status, "Pump state changed");
                REASON_EVENT_CHANGE
            }
            Some(_) => return None,
        };

        self.last_status = Some(status);
        Some(self.publish_status(status, false, reason).await)
    }

    /// Sample the real state and publish a heartbeat
    pub async fn on_heartbeat_tick(&mut self) -> Option<StatusPayload> {
        match self.sampler.sample() {
            Ok(status) => Some(self.publish_status(status, true, REASON_HEARTBEAT).await),
            Err(e) => {
                warn!(error = %e, "Failed to sample pump state for heartbeat");
                None
            }
        }
    }

    /// Build and publish one payload; a publish failure is logged, never raised
    pub async fn publish_status(&self, status: DeviceStatus, is_heartbeat: bool, reason: &str) -> StatusPayload {
        let builder = PayloadBuilder::new(&self.settings.device_id, &self.settings.location, self.clock.as_ref());
        let payload = builder.build(status, is_heartbeat, reason);

        let body = match payload.to_json() {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to serialize status payload");
                return payload;
            }
        };

        match self.publisher.publish(&self.settings.topic, body, self.settings.qos).await {
            Ok(()) => info!(
                topic = %self.settings.topic,
                status = %payload.status,
                reason = %payload.metadata.reason,
                "Published status"
            ),
            Err(e) => warn!(
                topic = %self.settings.topic,
                status = %payload.status,
                error = %e,
                "Publish failed; continuing with next cycle"
            ),
        }

        payload
    }

    /// Run until `shutdown` resolves
    pub async fn run<S>(&mut self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let start = Instant::now();
        let mut sample_timer = interval_at(start, self.settings.sample_interval);
        sample_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heartbeat_timer = interval_at(start + self.settings.heartbeat_interval, self.settings.heartbeat_interval);
        heartbeat_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            device_id = %self.settings.device_id,
            topic = %self.settings.topic,
            sample_secs = self.settings.sample_interval.as_secs(),
            heartbeat_secs = self.settings.heartbeat_interval.as_secs(),
            "Monitor agent started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = sample_timer.tick() => {
                    self.on_sample_tick().await;
                }
                _ = heartbeat_timer.tick() => {
                    self.on_heartbeat_tick().await;
                }
            }
        }

        Ok(())
    }
}
