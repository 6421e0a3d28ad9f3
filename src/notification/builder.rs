//! Channel selection - resolve each channel's secrets and build the active set
//!
//! Channel kinds are a closed set evaluated in declared order. Each kind is
//! resolved in isolation: a secret failure for one never affects another.

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use super::channel::{truncate_content, NotificationChannel};
use super::channels::{is_valid_webhook, DiscordChannel, DiscordConfig, TelegramChannel, TelegramConfig};
use crate::config::DispatcherConfig;
use crate::secrets::SecretResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Telegram,
    Discord,
}

impl ChannelKind {
    /// Fan-out order
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Telegram, ChannelKind::Discord];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Discord => "discord",
        }
    }
}

/// Constructs channel instances from resolved credentials
///
/// An error here means no channel can be built at all (e.g. the HTTP client
/// fails to initialise) and aborts the dispatch.
pub trait ChannelFactory: Send + Sync {
    fn telegram(&self, token: String, chat_id: String) -> Result<Box<dyn NotificationChannel>>;

    fn discord(&self, webhook_url: String) -> Result<Box<dyn NotificationChannel>>;
}

/// Builds the real HTTP channels, each with its own client and timeout
pub struct HttpChannelFactory {
    telegram_api_base: String,
    timeout: Duration,
}

impl HttpChannelFactory {
    pub fn new(telegram_api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            telegram_api_base: telegram_api_base.into(),
            timeout,
        }
    }

    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self::new(config.telegram_api_base.clone(), config.channel_timeout)
    }
}

impl ChannelFactory for HttpChannelFactory {
    fn telegram(&self, token: String, chat_id: String) -> Result<Box<dyn NotificationChannel>> {
        Ok(Box::new(TelegramChannel::new(TelegramConfig {
            api_base: self.telegram_api_base.clone(),
            token,
            chat_id,
            timeout: self.timeout,
        })?))
    }

    fn discord(&self, webhook_url: String) -> Result<Box<dyn NotificationChannel>> {
        Ok(Box::new(DiscordChannel::new(DiscordConfig {
            webhook_url,
            timeout: self.timeout,
        })?))
    }
}

/// Secret references per channel kind
#[derive(Debug, Clone)]
pub struct ChannelRefs {
    pub token_ref: String,
    pub chat_id_ref: String,
    pub webhook_ref: String,
}

impl From<&DispatcherConfig> for ChannelRefs {
    fn from(config: &DispatcherConfig) -> Self {
        Self {
            token_ref: config.token_ref.clone(),
            chat_id_ref: config.chat_id_ref.clone(),
            webhook_ref: config.webhook_ref.clone(),
        }
    }
}

/// Outcome of evaluating one channel kind
pub enum Selection {
    Active(Box<dyn NotificationChannel>),
    Skipped { kind: ChannelKind, reason: String },
}

/// Resolves secrets and builds the active channel set
pub struct ChannelSelector<'a> {
    refs: &'a ChannelRefs,
    resolver: &'a dyn SecretResolver,
    factory: &'a dyn ChannelFactory,
}

impl<'a> ChannelSelector<'a> {
    pub fn new(refs: &'a ChannelRefs, resolver: &'a dyn SecretResolver, factory: &'a dyn ChannelFactory) -> Self {
        Self { refs, resolver, factory }
    }

    /// Evaluate every kind in declared order
    pub fn select(&self) -> Result<Vec<Selection>> {
        ChannelKind::ALL.iter().map(|kind| self.evaluate(*kind)).collect()
    }

    /// Only the channels that made it into the active set
    pub fn active_channels(&self) -> Result<Vec<Box<dyn NotificationChannel>>> {
        Ok(self
            .select()?
            .into_iter()
            .filter_map(|s| match s {
                Selection::Active(channel) => Some(channel),
                Selection::Skipped { .. } => None,
            })
            .collect())
    }

    fn evaluate(&self, kind: ChannelKind) -> Result<Selection> {
        let selection = match kind {
            ChannelKind::Telegram => self.telegram()?,
            ChannelKind::Discord => self.discord()?,
        };

        match &selection {
            Selection::Active(_) => info!(channel = kind.as_str(), "Channel configured"),
            Selection::Skipped { reason, .. } => {
                warn!(channel = kind.as_str(), reason = %reason, "Channel skipped")
            }
        }
        Ok(selection)
    }

    fn telegram(&self) -> Result<Selection> {
        let skipped = |reason: String| Selection::Skipped {
            kind: ChannelKind::Telegram,
            reason,
        };

        let token = match self.resolver.resolve(&self.refs.token_ref, true) {
            Ok(token) => token,
            Err(e) => return Ok(skipped(e.to_string())),
        };
        let chat_id = match self.resolver.resolve(&self.refs.chat_id_ref, false) {
            Ok(chat_id) => chat_id,
            Err(e) => return Ok(skipped(e.to_string())),
        };
        if token.is_empty() || chat_id.is_empty() {
            return Ok(skipped("token or chat_id is empty".to_string()));
        }

        Ok(Selection::Active(self.factory.telegram(token, chat_id)?))
    }

    fn discord(&self) -> Result<Selection> {
        let webhook_url = match self.resolver.resolve(&self.refs.webhook_ref, true) {
            Ok(url) => url,
            Err(e) => {
                return Ok(Selection::Skipped {
                    kind: ChannelKind::Discord,
                    reason: e.to_string(),
                })
            }
        };

        if !is_valid_webhook(&webhook_url) {
            return Ok(Selection::Skipped {
                kind: ChannelKind::Discord,
                reason: format!(
                    "webhook value does not start with https ('{}')",
                    truncate_content(&webhook_url, 15)
                ),
            });
        }

        Ok(Selection::Active(self.factory.discord(webhook_url)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channel::{NotificationMessage, SendResult};
    use crate::secrets::SecretError;
    use std::collections::HashMap;

    struct MapResolver(HashMap<&'static str, &'static str>);

    impl SecretResolver for MapResolver {
        fn resolve(&self, name: &str, _decrypt: bool) -> Result<String, SecretError> {
            self.0
                .get(name)
                .map(|v| v.to_string())
                .ok_or_else(|| SecretError::NotFound { name: name.to_string() })
        }
    }

    struct NamedChannel(String);

    impl NotificationChannel for NamedChannel {
        fn name(&self) -> &str {
            &self.0
        }

        fn send(&self, _message: &NotificationMessage) -> Result<SendResult> {
            Ok(SendResult::Sent)
        }
    }

    struct NamedFactory;

    impl ChannelFactory for NamedFactory {
        fn telegram(&self, token: String, chat_id: String) -> Result<Box<dyn NotificationChannel>> {
            Ok(Box::new(NamedChannel(format!("telegram:{}:{}", token, chat_id))))
        }

        fn discord(&self, webhook_url: String) -> Result<Box<dyn NotificationChannel>> {
            Ok(Box::new(NamedChannel(format!("discord:{}", webhook_url))))
        }
    }

    fn refs() -> ChannelRefs {
        ChannelRefs {
            token_ref: "/test/token".into(),
            chat_id_ref: "/test/chat_id".into(),
            webhook_ref: "/test/discord".into(),
        }
    }

    fn names(resolver: &MapResolver) -> Vec<String> {
        let refs = refs();
        ChannelSelector::new(&refs, resolver, &NamedFactory)
            .active_channels()
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    #[test]
    fn test_all_channels_in_declared_order() {
        let resolver = MapResolver(
            [
                ("/test/token", "tok"),
                ("/test/chat_id", "42"),
                ("/test/discord", "https://discord.example/hook"),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(names(&resolver), vec!["telegram:tok:42", "discord:https://discord.example/hook"]);
    }

    #[test]
    fn test_discord_failure_keeps_telegram() {
        let resolver = MapResolver([("/test/token", "tok"), ("/test/chat_id", "42")].into_iter().collect());
        assert_eq!(names(&resolver), vec!["telegram:tok:42"]);
    }

    #[test]
    fn test_partial_telegram_secrets_skip_telegram() {
        let resolver = MapResolver(
            [("/test/token", "tok"), ("/test/discord", "https://discord.example/hook")]
                .into_iter()
                .collect(),
        );
        assert_eq!(names(&resolver), vec!["discord:https://discord.example/hook"]);
    }

    #[test]
    fn test_plain_http_webhook_is_rejected() {
        let resolver = MapResolver([("/test/discord", "http://discord.example/hook")].into_iter().collect());
        let refs = refs();
        let selections = ChannelSelector::new(&refs, &resolver, &NamedFactory).select().unwrap();

        assert_eq!(selections.len(), 2);
        match &selections[1] {
            Selection::Skipped { kind, reason } => {
                assert_eq!(*kind, ChannelKind::Discord);
                assert!(reason.contains("https"));
            }
            Selection::Active(_) => panic!("plain http webhook must not be selected"),
        }
    }

    #[test]
    fn test_nothing_resolvable() {
        let resolver = MapResolver(HashMap::new());
        assert!(names(&resolver).is_empty());
    }

    #[test]
    fn test_http_factory_builds_named_channels() {
        let factory = HttpChannelFactory::new("https://api.telegram.org", Duration::from_secs(5));
        assert_eq!(factory.telegram("t".into(), "c".into()).unwrap().name(), "telegram");
        assert_eq!(factory.discord("https://x".into()).unwrap().name(), "discord");
    }
}
