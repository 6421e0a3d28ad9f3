//! Status payload - the wire record published per sample or heartbeat

use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::status::{DeviceStatus, HEARTBEAT_OK};

/// Publish reason for a detected state change
pub const REASON_EVENT_CHANGE: &str = "event_change";
/// Publish reason for the periodic liveness message
pub const REASON_HEARTBEAT: &str = "heartbeat";
/// Publish reason for the first report after the agent starts
pub const REASON_STARTUP: &str = "startup";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMetadata {
    pub reason: String,
    pub location: String,
}

/// JSON body published to the telemetry topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub device_id: String,
    /// Epoch seconds
    pub timestamp: i64,
    /// Display status: the real status, or `HEARTBEAT_OK` on heartbeats
    pub status: String,
    /// Actual sampled status; only present on heartbeats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_state: Option<String>,
    /// 1 when the pump is really active, 0 otherwise
    pub sensor_voltage: u8,
    pub metadata: PayloadMetadata,
}

impl StatusPayload {
    pub fn is_heartbeat(&self) -> bool {
        self.status == HEARTBEAT_OK
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Builds status payloads for one device
///
/// `real_state` and `sensor_voltage` always come from the sampled status,
/// never from the display status.
pub struct PayloadBuilder<'a> {
    device_id: &'a str,
    location: &'a str,
    clock: &'a dyn Clock,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(device_id: &'a str, location: &'a str, clock: &'a dyn Clock) -> Self {
        Self {
            device_id,
            location,
            clock,
        }
    }

    pub fn build(&self, real_status: DeviceStatus, is_heartbeat: bool, reason: &str) -> StatusPayload {
        let (status, real_state) = if is_heartbeat {
            (HEARTBEAT_OK.to_string(), Some(real_status.as_str().to_string()))
        } else {
            (real_status.as_str().to_string(), None)
        };

        StatusPayload {
            device_id: self.device_id.to_string(),
            timestamp: self.clock.now(),
            status,
            real_state,
            sensor_voltage: real_status.sensor_voltage(),
            metadata: PayloadMetadata {
                reason: reason.to_string(),
                location: self.location.to_string(),
            },
        }
    }

    /// State-change publish
    pub fn event(&self, real_status: DeviceStatus, reason: &str) -> StatusPayload {
        self.build(real_status, false, reason)
    }

    /// Liveness publish carrying the real state alongside `HEARTBEAT_OK`
    pub fn heartbeat(&self, real_status: DeviceStatus) -> StatusPayload {
        self.build(real_status, true, REASON_HEARTBEAT)
    }
}
