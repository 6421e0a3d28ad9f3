//! Alert notification - format pump events and fan them out to channels
//!
//! # Design
//! 1. One interface: every channel implements `NotificationChannel`
//! 2. Isolation: a channel whose secrets fail to resolve is left out; a
//!    channel that fails to send never stops the others
//! 3. Closed set: channel kinds are fixed and evaluated in declared order
//!
//! # Example
//! ```ignore
//! use heating_monitor::notification::{AlertDispatcher, AlertEvent, HttpChannelFactory};
//!
//! let dispatcher = AlertDispatcher::new(config.clone(), resolver, Arc::new(HttpChannelFactory::from_config(&config)));
//! let outcome = dispatcher.dispatch(&AlertEvent::new("INACTIVE", "heating-pump-pi-01"))?;
//! ```

pub mod builder;
pub mod channel;
pub mod channels;
pub mod dispatcher;
pub mod event;
pub mod formatter;
pub mod urgency;

pub use builder::{ChannelFactory, ChannelKind, ChannelRefs, ChannelSelector, HttpChannelFactory, Selection};
pub use channel::{NotificationChannel, NotificationMessage, SendResult};
pub use dispatcher::{AlertDispatcher, ChannelReport, DispatchOutcome};
pub use event::{AlertEvent, EventMetadata};
pub use formatter::format_alert;
pub use urgency::{get_urgency, Urgency};
