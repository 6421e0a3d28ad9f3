//! Alert dispatcher - fan one event out to every configured channel
//!
//! Each `dispatch` call is a complete, independent unit of work:
//! format -> resolve secrets per channel -> select -> fan out -> tally.
//! Nothing is kept between calls, so a retried invocation starts clean.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::builder::{ChannelFactory, ChannelRefs, ChannelSelector};
use super::channel::{NotificationChannel, NotificationMessage, SendResult};
use super::event::AlertEvent;
use super::formatter::format_alert;
use crate::config::DispatcherConfig;
use crate::secrets::SecretResolver;

pub const STATUS_OK: u16 = 200;
/// No channel could be configured; needs operator action
pub const STATUS_NO_CHANNELS: u16 = 500;
/// Channels were attempted but none delivered
pub const STATUS_ALL_FAILED: u16 = 502;

#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: String,
    #[serde(flatten)]
    pub result: SendResult,
}

/// Structured result consumed by the invocation logs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub status_code: u16,
    pub body: String,
    pub channels_succeeded: usize,
    pub channels_attempted: usize,
    pub channels: Vec<ChannelReport>,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    fn no_channels() -> Self {
        Self {
            status_code: STATUS_NO_CHANNELS,
            body: "No notification channels configured".to_string(),
            channels_succeeded: 0,
            channels_attempted: 0,
            channels: Vec::new(),
        }
    }
}

pub struct AlertDispatcher {
    config: DispatcherConfig,
    resolver: Arc<dyn SecretResolver>,
    factory: Arc<dyn ChannelFactory>,
    dry_run: bool,
}

impl AlertDispatcher {
    pub fn new(config: DispatcherConfig, resolver: Arc<dyn SecretResolver>, factory: Arc<dyn ChannelFactory>) -> Self {
        Self {
            config,
            resolver,
            factory,
            dry_run: false,
        }
    }

    /// Resolve and select channels but do not send
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Parse a raw JSON event body and dispatch it
    pub fn dispatch_json(&self, raw: &str) -> Result<DispatchOutcome> {
        let event: AlertEvent = serde_json::from_str(raw).map_err(|e| anyhow!("Malformed alert event: {}", e))?;
        self.dispatch(&event)
    }

    /// Dispatch one event
    ///
    /// Returns `Err` only when the dispatch cannot be attempted at all, or when
    /// `escalate_on_total_failure` is set and every attempted channel failed.
    /// Both cases are meant to fail the invocation so the host retries it.
    pub fn dispatch(&self, event: &AlertEvent) -> Result<DispatchOutcome> {
        info!(status = %event.status, device_id = %event.device_id, "Event received");

        let message = format_alert(event, self.config.location.as_deref());

        let refs = ChannelRefs::from(&self.config);
        let channels = ChannelSelector::new(&refs, self.resolver.as_ref(), self.factory.as_ref()).active_channels()?;

        if channels.is_empty() {
            error!("No notification channels configured!");
            return Ok(DispatchOutcome::no_channels());
        }

        if self.dry_run {
            let names: Vec<&str> = channels.iter().map(|c| c.name()).collect();
            info!(channels = ?names, "[DRY-RUN] Would send alert");
            return Ok(DispatchOutcome {
                status_code: STATUS_OK,
                body: format!("Dry run: message would be sent to {} channels.", channels.len()),
                channels_succeeded: 0,
                channels_attempted: 0,
                channels: channels
                    .iter()
                    .map(|c| ChannelReport {
                        channel: c.name().to_string(),
                        result: SendResult::Skipped("dry-run".to_string()),
                    })
                    .collect(),
            });
        }

        let reports = fan_out(&channels, &message);
        let attempted = reports.len();
        let succeeded = reports.iter().filter(|r| r.result.is_delivered()).count();

        let body = format!("Message sent to {}/{} channels.", succeeded, attempted);
        info!(succeeded, attempted, "{}", body);

        if succeeded == 0 && self.config.escalate_on_total_failure {
            return Err(anyhow!("All {} notification channels failed", attempted));
        }

        Ok(DispatchOutcome {
            status_code: if succeeded > 0 { STATUS_OK } else { STATUS_ALL_FAILED },
            body,
            channels_succeeded: succeeded,
            channels_attempted: attempted,
            channels: reports,
        })
    }
}

/// Send to every channel in order; a failing or panicking channel is recorded
/// as failed and never stops the remaining ones
fn fan_out(channels: &[Box<dyn NotificationChannel>], message: &NotificationMessage) -> Vec<ChannelReport> {
    channels
        .iter()
        .map(|channel| {
            let name = channel.name().to_string();
            let result = match catch_unwind(AssertUnwindSafe(|| channel.send(message))) {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    error!(channel = %name, error = %e, "ERROR sending to channel");
                    SendResult::Failed(e.to_string())
                }
                Err(panic) => {
                    let detail = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "channel panicked".to_string());
                    error!(channel = %name, panic = %detail, "Channel panicked while sending");
                    SendResult::Failed(detail)
                }
            };

            if !result.is_delivered() {
                warn!(channel = %name, result = ?result, "Channel did not deliver");
            }
            ChannelReport { channel: name, result }
        })
        .collect()
}
