//! Inbound alert event
//!
//! The event body is a previously published status payload, filtered upstream
//! to `status == "INACTIVE"`. Every field is optional on the wire so a sparse
//! or hand-written event still produces a message.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    #[serde(default = "unknown_status")]
    pub status: String,
    #[serde(default = "unknown_device")]
    pub device_id: String,
    /// Epoch seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
}

fn unknown_status() -> String {
    "UNKNOWN".into()
}

fn unknown_device() -> String {
    "n/a".into()
}

impl AlertEvent {
    pub fn new(status: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            device_id: device_id.into(),
            timestamp: None,
            metadata: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.metadata.get_or_insert_with(EventMetadata::default).location = Some(location.into());
        self
    }

    pub fn is_inactive(&self) -> bool {
        self.status == "INACTIVE"
    }

    pub fn location(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.location.as_deref())
    }
}
