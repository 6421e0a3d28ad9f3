//! Secret resolution
//!
//! Configuration only ever holds secret *references*; values are fetched at
//! dispatch time through a [`SecretResolver`]. Nothing is cached between
//! resolves, so a rotated secret is picked up by the next invocation.

pub mod env_store;
pub mod file_store;

pub use env_store::EnvSecretStore;
pub use file_store::FileParameterStore;

use thiserror::Error;

/// Reasons a secret is unavailable
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret {name} not found")]
    NotFound { name: String },
    #[error("access to secret {name} denied")]
    AccessDenied { name: String },
    #[error("secret {name} is stored encrypted and must be resolved with decryption")]
    DecryptionRequired { name: String },
    #[error("secret store error while resolving {name}: {message}")]
    Store { name: String, message: String },
}

impl SecretError {
    pub fn name(&self) -> &str {
        match self {
            SecretError::NotFound { name }
            | SecretError::AccessDenied { name }
            | SecretError::DecryptionRequired { name }
            | SecretError::Store { name, .. } => name,
        }
    }
}

/// Capability: resolve a named secret to its value
pub trait SecretResolver: Send + Sync {
    /// `decrypt` must be set for secrets stored encrypted at rest
    /// (bot tokens, webhook URLs) and left unset for plain values (chat ids).
    fn resolve(&self, name: &str, decrypt: bool) -> Result<String, SecretError>;
}
