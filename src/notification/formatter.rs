//! Alert message formatting
//!
//! Pure and channel independent. Both Telegram (`parse_mode: Markdown`) and
//! Discord render the same Markdown text.

use chrono::{TimeZone, Utc};

use super::channel::NotificationMessage;
use super::event::AlertEvent;
use super::urgency::get_urgency;

/// Format `timestamp` (epoch seconds) as `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_timestamp(timestamp: i64) -> Option<String> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Escape the legacy Markdown entity characters in free text
///
/// Telegram rejects a message with an unmatched `_`, `*`, `` ` `` or `[`.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Text for a code span, which cannot contain a backtick
fn code_span(text: &str) -> String {
    format!("`{}`", text.replace('`', "'"))
}

/// Build the message for `event`
///
/// `fallback_location` is used when the event carries no location.
pub fn format_alert(event: &AlertEvent, fallback_location: Option<&str>) -> NotificationMessage {
    let urgency = get_urgency(&event.status);

    let content = if event.is_inactive() {
        let mut lines = vec![
            "⚠️ *ALERT* ⚠️".to_string(),
            "The boiler is inactive!".to_string(),
            format!("Device: {}", code_span(&event.device_id)),
        ];
        if let Some(location) = event.location().or(fallback_location) {
            lines.push(format!("Location: {}", escape_markdown(location)));
        }
        if let Some(time) = event.timestamp.and_then(format_timestamp) {
            lines.push(format!("Time: {}", time));
        }
        lines.join("\n")
    } else {
        format!(
            "Status info: {} (Device: {})",
            escape_markdown(&event.status),
            escape_markdown(&event.device_id)
        )
    };

    NotificationMessage::new(content, urgency).with_device_id(event.device_id.clone())
}
