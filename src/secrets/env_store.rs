//! Environment variable secret store
//!
//! Maps a reference such as `/heating-monitor/telegram-token` to the variable
//! `HEATING_MONITOR_TELEGRAM_TOKEN`. Environment values are never encrypted,
//! so the decrypt flag has no effect here.

use std::collections::HashMap;
use tracing::debug;

use super::{SecretError, SecretResolver};

/// Environment variable name for a secret reference
pub fn env_key(name: &str) -> String {
    name.trim_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

pub struct EnvSecretStore {
    /// Fixed snapshot instead of the process environment
    overrides: Option<HashMap<String, String>>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self { overrides: None }
    }

    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self { overrides: Some(vars) }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match &self.overrides {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretResolver for EnvSecretStore {
    fn resolve(&self, name: &str, decrypt: bool) -> Result<String, SecretError> {
        let key = env_key(name);
        match self.lookup(&key) {
            Some(value) if !value.trim().is_empty() => {
                debug!(name, key = %key, decrypt, "Resolved secret from environment");
                Ok(value)
            }
            _ => Err(SecretError::NotFound { name: name.to_string() }),
        }
    }
}
