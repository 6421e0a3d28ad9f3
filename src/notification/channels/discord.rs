//! Discord webhook channel

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::notification::channel::{truncate_content, NotificationChannel, NotificationMessage, SendResult};

/// Webhook limit for `content`
const MAX_CONTENT_CHARS: usize = 2000;
const USERNAME: &str = "Boiler Monitor";

/// A webhook value is usable only if it is an https URL
pub fn is_valid_webhook(url: &str) -> bool {
    url.starts_with("https")
}

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub webhook_url: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: String,
    username: &'a str,
}

pub struct DiscordChannel {
    client: reqwest::blocking::Client,
    config: DiscordConfig,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow!("Cannot create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }
}

impl NotificationChannel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    fn send(&self, message: &NotificationMessage) -> Result<SendResult> {
        if self.config.webhook_url.is_empty() {
            warn!(channel = "discord", "Discord webhook URL missing");
            return Ok(SendResult::Failed("missing webhook_url".to_string()));
        }

        let payload = WebhookPayload {
            content: truncate_content(&message.content, MAX_CONTENT_CHARS),
            username: USERNAME,
        };

        // webhook URLs carry their own credential; keep them out of logged errors
        let response = match self
            .client
            .post(&self.config.webhook_url)
            .header("User-Agent", concat!("heating-monitor/", env!("CARGO_PKG_VERSION")))
            .json(&payload)
            .send()
        {
            Ok(response) => response,
            Err(e) => {
                let e = e.without_url();
                error!(channel = "discord", error = %e, "Discord request failed");
                return Ok(SendResult::Failed(e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            info!(channel = "discord", device_id = ?message.device_id, "Discord message sent successfully");
            Ok(SendResult::Sent)
        } else {
            error!(channel = "discord", %status, "Discord rejected message");
            Ok(SendResult::Failed(format!("HTTP {}", status)))
        }
    }
}
