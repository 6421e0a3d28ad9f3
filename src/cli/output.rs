//! Output formatting for CLI commands

use serde::Serialize;

/// Pretty JSON for terminals, single-line JSON for log pipelines
pub fn format_output<T: Serialize>(data: &T, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    };
    rendered.unwrap_or_else(|_| "{}".to_string())
}
