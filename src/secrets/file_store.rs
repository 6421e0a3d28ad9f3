//! JSON parameter file secret store
//!
//! ```json
//! {
//!   "/heating-monitor/telegram-token": { "value": "123:abc", "secure": true },
//!   "/heating-monitor/telegram-chat-id": "4242"
//! }
//! ```
//!
//! A bare string is a plain parameter. The file is re-read on every resolve
//! under a shared lock, so a writer holding an exclusive lock during rotation
//! is never observed half-written.

use fs2::FileExt;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{SecretError, SecretResolver};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Parameter {
    Plain(String),
    Typed {
        value: String,
        #[serde(default)]
        secure: bool,
    },
}

pub struct FileParameterStore {
    path: PathBuf,
}

impl FileParameterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_parameters(&self, name: &str) -> Result<HashMap<String, Parameter>, SecretError> {
        let io_error = |e: std::io::Error| match e.kind() {
            ErrorKind::PermissionDenied => SecretError::AccessDenied { name: name.to_string() },
            _ => SecretError::Store {
                name: name.to_string(),
                message: format!("{}: {}", self.path.display(), e),
            },
        };

        let mut file = File::open(&self.path).map_err(io_error)?;
        FileExt::lock_shared(&file).map_err(io_error)?;
        let mut raw = String::new();
        let read = file.read_to_string(&mut raw);
        // unlock before propagating any read error
        let _ = FileExt::unlock(&file);
        read.map_err(io_error)?;

        serde_json::from_str(&raw).map_err(|e| SecretError::Store {
            name: name.to_string(),
            message: format!("malformed parameter file {}: {}", self.path.display(), e),
        })
    }
}

impl SecretResolver for FileParameterStore {
    fn resolve(&self, name: &str, decrypt: bool) -> Result<String, SecretError> {
        let mut params = self.read_parameters(name)?;
        let param = params
            .remove(name)
            .ok_or_else(|| SecretError::NotFound { name: name.to_string() })?;

        let value = match param {
            Parameter::Plain(value) => value,
            Parameter::Typed { secure: true, .. } if !decrypt => {
                return Err(SecretError::DecryptionRequired { name: name.to_string() });
            }
            Parameter::Typed { value, .. } => value,
        };

        debug!(name, decrypt, "Resolved secret from parameter file");
        Ok(value)
    }
}
