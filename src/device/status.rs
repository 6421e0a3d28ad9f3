//! Pump status and raw input level
//!
//! The pump relay is wired active-low: pulling the input line to ground means
//! the pump is running. `DeviceStatus::from_level` is the only place that
//! inversion lives.

use serde::{Deserialize, Serialize};

/// Display status sent on heartbeat publishes instead of the real state
pub const HEARTBEAT_OK: &str = "HEARTBEAT_OK";

/// Electrical level read from a digital input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Parse a sysfs-style value (`0` / `1`, surrounding whitespace allowed)
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" => Some(Level::Low),
            "1" => Some(Level::High),
            _ => None,
        }
    }
}

/// Real, physical pump state at sample time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Active,
    Inactive,
}

impl DeviceStatus {
    /// Active-low mapping: LOW -> ACTIVE, HIGH -> INACTIVE
    pub fn from_level(level: Level) -> Self {
        match level {
            Level::Low => DeviceStatus::Active,
            Level::High => DeviceStatus::Inactive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "ACTIVE",
            DeviceStatus::Inactive => "INACTIVE",
        }
    }

    /// Normalized boolean-as-integer for numeric storage downstream
    pub fn sensor_voltage(&self) -> u8 {
        match self {
            DeviceStatus::Active => 1,
            DeviceStatus::Inactive => 0,
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
