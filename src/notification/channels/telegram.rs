//! Telegram Bot API channel

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::notification::channel::{truncate_content, NotificationChannel, NotificationMessage, SendResult};

/// Bot API limit for message text
const MAX_TEXT_CHARS: usize = 4096;

/// Telegram channel configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// e.g. `https://api.telegram.org`
    pub api_base: String,
    pub token: String,
    pub chat_id: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'a str,
}

pub struct TelegramChannel {
    client: reqwest::blocking::Client,
    config: TelegramConfig,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow!("Cannot create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.config.api_base.trim_end_matches('/'), self.config.token)
    }
}

impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn send(&self, message: &NotificationMessage) -> Result<SendResult> {
        if self.config.token.is_empty() || self.config.chat_id.is_empty() {
            warn!(channel = "telegram", "Telegram config missing (token or chat_id)");
            return Ok(SendResult::Failed("missing token or chat_id".to_string()));
        }

        let request = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text: truncate_content(&message.content, MAX_TEXT_CHARS),
            parse_mode: "Markdown",
        };

        // the endpoint embeds the bot token; keep it out of logged errors
        let response = match self.client.post(self.endpoint()).json(&request).send() {
            Ok(response) => response,
            Err(e) => {
                let e = e.without_url();
                error!(channel = "telegram", error = %e, "Telegram request failed");
                return Ok(SendResult::Failed(e.to_string()));
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            info!(channel = "telegram", device_id = ?message.device_id, "Telegram message sent successfully");
            Ok(SendResult::Sent)
        } else {
            let body = response.text().unwrap_or_default();
            error!(channel = "telegram", %status, body = %truncate_content(&body, 200), "Telegram rejected message");
            Ok(SendResult::Failed(format!("HTTP {}", status)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channels::test_server;
    use crate::notification::urgency::Urgency;

    fn channel(api_base: String, token: &str, chat_id: &str) -> TelegramChannel {
        TelegramChannel::new(TelegramConfig {
            api_base,
            token: token.into(),
            chat_id: chat_id.into(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_template() {
        let ch = channel("https://api.telegram.org/".into(), "123:abc", "42");
        assert_eq!(ch.endpoint(), "https://api.telegram.org/bot123:abc/sendMessage");
    }

    #[test]
    fn test_missing_config_is_not_delivered() {
        let ch = channel("http://127.0.0.1:9".into(), "", "42");
        let result = ch.send(&NotificationMessage::new("hi", Urgency::High)).unwrap();
        assert!(matches!(result, SendResult::Failed(_)));
    }

    #[test]
    fn test_http_200_is_delivered() {
        let (base, request) = test_server::respond_once(200);
        let ch = channel(base, "123:abc", "4242");

        let result = ch.send(&NotificationMessage::new("boiler down", Urgency::High)).unwrap();
        assert_eq!(result, SendResult::Sent);

        let request = request.join().unwrap();
        assert!(request.starts_with("POST /bot123:abc/sendMessage "));
        let body = test_server::json_body(&request);
        assert_eq!(body["chat_id"], "4242");
        assert_eq!(body["text"], "boiler down");
        assert_eq!(body["parse_mode"], "Markdown");
    }

    #[test]
    fn test_other_2xx_is_not_delivered() {
        let (base, request) = test_server::respond_once(204);
        let ch = channel(base, "t", "c");
        let result = ch.send(&NotificationMessage::new("x", Urgency::High)).unwrap();
        assert_eq!(result, SendResult::Failed("HTTP 204 No Content".into()));
        request.join().unwrap();
    }

    #[test]
    fn test_unreachable_is_not_delivered() {
        let ch = channel(test_server::closed_base_url(), "t", "c");
        let result = ch.send(&NotificationMessage::new("x", Urgency::High)).unwrap();
        assert!(!result.is_delivered());
    }
}
