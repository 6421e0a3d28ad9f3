//! CLI command handling

pub mod agent;
pub mod dispatch;
pub mod output;

pub use agent::*;
pub use dispatch::*;
pub use output::*;
