//! Configuration for the device agent and the alert dispatcher
//!
//! The agent reads a local JSON file once at startup. The dispatcher reads
//! environment variables that carry secret *references* (parameter names),
//! never secret values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TOPIC: &str = "home/heating/status";
pub const DEFAULT_LOCATION: &str = "Boiler Room";

pub const DEFAULT_TOKEN_REF: &str = "/heating-monitor/telegram-token";
pub const DEFAULT_CHAT_ID_REF: &str = "/heating-monitor/telegram-chat-id";
pub const DEFAULT_WEBHOOK_REF: &str = "/heating-monitor/discord-webhook";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_CHANNEL_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path} not found")]
    Missing { path: PathBuf },
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Device-local agent configuration (`iot_config.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// MQTT broker endpoint (host name)
    pub endpoint: String,
    /// Device identity, also used as MQTT client id
    pub thing_name: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_qos")]
    pub qos: u8,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_gpio_pin")]
    pub gpio_pin: u32,
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    /// PEM CA bundle for the broker
    #[serde(default)]
    pub ca_file: Option<PathBuf>,
    /// Device certificate for mutual TLS
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    #[serde(default)]
    pub key_file: Option<PathBuf>,
}

fn default_port() -> u16 {
    8883
}
fn default_topic() -> String {
    DEFAULT_TOPIC.into()
}
fn default_qos() -> u8 {
    1
}
fn default_location() -> String {
    DEFAULT_LOCATION.into()
}
fn default_sample_interval() -> u64 {
    5
}
fn default_heartbeat_interval() -> u64 {
    3600
}
fn default_gpio_pin() -> u32 {
    17
}
fn default_gpio_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}
fn default_keep_alive() -> u64 {
    30
}

impl AgentConfig {
    /// Default location: `~/.config/heating-monitor/iot_config.json`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("heating-monitor")
            .join("iot_config.json")
    }

    /// Load and validate; absence or malformed content is a startup failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Missing { path: path.to_path_buf() });
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint is empty".into()));
        }
        if self.thing_name.trim().is_empty() {
            return Err(ConfigError::Invalid("thing_name is empty".into()));
        }
        if self.qos > 1 {
            return Err(ConfigError::Invalid(format!("qos must be 0 or 1, got {}", self.qos)));
        }
        if self.sample_interval_secs == 0 || self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::Invalid("intervals must be greater than zero".into()));
        }
        if self.cert_file.is_some() != self.key_file.is_some() {
            return Err(ConfigError::Invalid("cert_file and key_file must be set together".into()));
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

/// Alert dispatcher configuration, read from the invocation environment
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// Secret reference of the Telegram bot token
    pub token_ref: String,
    /// Secret reference of the Telegram chat id
    pub chat_id_ref: String,
    /// Secret reference of the Discord webhook URL
    pub webhook_ref: String,
    /// Location shown in alert messages when the event carries none
    pub location: Option<String>,
    pub telegram_api_base: String,
    pub channel_timeout: Duration,
    /// Fail the invocation when every attempted channel failed
    pub escalate_on_total_failure: bool,
    /// JSON parameter file; `None` resolves secrets from the environment
    pub secret_store: Option<PathBuf>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            token_ref: DEFAULT_TOKEN_REF.into(),
            chat_id_ref: DEFAULT_CHAT_ID_REF.into(),
            webhook_ref: DEFAULT_WEBHOOK_REF.into(),
            location: None,
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.into(),
            channel_timeout: Duration::from_secs(DEFAULT_CHANNEL_TIMEOUT_SECS),
            escalate_on_total_failure: false,
            secret_store: None,
        }
    }
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(v) = get("SSM_KEY_TOKEN") {
            config.token_ref = v;
        }
        if let Some(v) = get("SSM_KEY_CHAT_ID") {
            config.chat_id_ref = v;
        }
        if let Some(v) = get("SSM_KEY_DISCORD_WEBHOOK") {
            config.webhook_ref = v;
        }
        config.location = get("ALERT_LOCATION");
        if let Some(v) = get("TELEGRAM_API_BASE") {
            config.telegram_api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("CHANNEL_TIMEOUT_SECS") {
            let secs: u64 = v
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("CHANNEL_TIMEOUT_SECS is not a number: {}", v)))?;
            if secs == 0 {
                return Err(ConfigError::Invalid("CHANNEL_TIMEOUT_SECS must be greater than zero".into()));
            }
            config.channel_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("ALERT_ESCALATE_ON_TOTAL_FAILURE") {
            config.escalate_on_total_failure = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        config.secret_store = get("SECRET_STORE").map(PathBuf::from);

        Ok(config)
    }
}
