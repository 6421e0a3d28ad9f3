//! Notification channel trait

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::urgency::Urgency;

/// Formatted alert ready to be delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Message text (Markdown)
    pub content: String,
    pub urgency: Urgency,
    /// Reporting device, for logs
    pub device_id: Option<String>,
}

impl NotificationMessage {
    pub fn new(content: impl Into<String>, urgency: Urgency) -> Self {
        Self {
            content: content.into(),
            urgency,
            device_id: None,
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }
}

/// Outcome of one channel send
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum SendResult {
    Sent,
    /// Not sent on purpose (dry-run)
    Skipped(String),
    Failed(String),
}

impl SendResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendResult::Sent)
    }
}

/// A single external messaging integration
///
/// Expected failures (missing config, network error, non-success status) are
/// reported as `Ok(SendResult::Failed(..))`. An `Err` is an unexpected fault;
/// the dispatcher isolates it to this channel.
pub trait NotificationChannel: Send + Sync {
    /// Channel name for logs and results
    fn name(&self) -> &str;

    fn send(&self, message: &NotificationMessage) -> Result<SendResult>;
}

/// Truncate to at most `max_chars` characters, marking the cut with `...`
pub fn truncate_content(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
