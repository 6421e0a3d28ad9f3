//! Device side - sample the pump input and publish status payloads

pub mod agent;
pub mod clock;
pub mod payload;
pub mod publisher;
pub mod sampler;
pub mod status;

pub use agent::{AgentSettings, MonitorAgent};
pub use clock::{Clock, FixedClock, MonotonicClock};
pub use payload::{PayloadBuilder, PayloadMetadata, StatusPayload, REASON_EVENT_CHANGE, REASON_HEARTBEAT, REASON_STARTUP};
pub use publisher::{MqttPublisher, TelemetryPublisher};
pub use sampler::{DeviceStateSampler, InputLine, ScriptedLine, SysfsLine};
pub use status::{DeviceStatus, Level, HEARTBEAT_OK};
