//! Last-used login cached on disk.
//!
//! The file is a single JSON object. It is read on every request, so edits
//! made outside the host are picked up without a restart.

#[cfg(test)]
#[path = "credentials_test.rs"]
mod credentials_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::HostError;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents, or `{}` when the file does not exist.
    ///
    /// # Errors
    ///
    /// [`HostError::Io`] when the file cannot be read, [`HostError::Json`]
    /// when it does not hold JSON.
    pub fn load(&self) -> Result<Value, HostError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Value::Object(Map::new())),
            Err(source) => return Err(HostError::Io { path: self.path.clone(), source }),
        };
        serde_json::from_str(&text).map_err(|source| HostError::Json { path: self.path.clone(), source })
    }

    /// Shallow-merge `partial` over the file contents and write it back.
    /// Returns the merged object.
    ///
    /// # Errors
    ///
    /// See [`CredentialStore::load`]; write failures are [`HostError::Io`].
    pub fn save(&self, partial: &Value) -> Result<Value, HostError> {
        let mut merged = match self.load()? {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        if let Value::Object(fields) = partial {
            for (key, value) in fields {
                merged.insert(key.clone(), value.clone());
            }
        } else {
            tracing::warn!(path = %self.path.display(), "ignoring non-object credential update");
        }

        let merged = Value::Object(merged);
        std::fs::write(&self.path, merged.to_string())
            .map_err(|source| HostError::Io { path: self.path.clone(), source })?;
        Ok(merged)
    }
}
