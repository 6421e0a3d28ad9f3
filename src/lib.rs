//! Heating monitor - boiler pump telemetry and alerting
//!
//! `device` samples the pump input and publishes status payloads;
//! `notification` turns status events into alerts on every configured channel.

pub mod cli;
pub mod config;
pub mod device;
pub mod notification;
pub mod secrets;

pub use config::{AgentConfig, ConfigError, DispatcherConfig};
pub use device::{
    AgentSettings, Clock, DeviceStateSampler, DeviceStatus, Level, MonitorAgent, MonotonicClock, MqttPublisher,
    PayloadBuilder, StatusPayload, TelemetryPublisher, HEARTBEAT_OK,
};
pub use notification::{
    AlertDispatcher, AlertEvent, ChannelFactory, DispatchOutcome, HttpChannelFactory, NotificationChannel,
    NotificationMessage, SendResult, Urgency,
};
pub use secrets::{EnvSecretStore, FileParameterStore, SecretError, SecretResolver};
