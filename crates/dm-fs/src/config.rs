//! JSON document loading and saving

use crate::{Error, NormalizedPath, Result, io};
use serde::{Serialize, de::DeserializeOwned};

/// Store for the JSON documents the data manager persists
/// (user configuration, per-container metadata).
///
/// Only the `.json` extension is accepted. Saves are atomic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    /// Create a new ConfigStore.
    pub fn new() -> Self {
        Self
    }

    /// Load a document from a file.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        check_extension(path)?;
        let content = io::read_text_locked(path)?;
        serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_native(),
            format: "JSON".into(),
            message: e.to_string(),
        })
    }

    /// Load a document, falling back to `T::default()` when the file is
    /// missing or the location is not a regular file.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, path: &NormalizedPath) -> Result<T> {
        if !path.is_file() {
            tracing::debug!(path = %path, "No document found, using defaults");
            return Ok(T::default());
        }
        self.load(path)
    }

    /// Save a document to a file as pretty-printed JSON.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        check_extension(path)?;
        let mut content = serde_json::to_string_pretty(value).map_err(|e| Error::ConfigSerialize {
            path: path.to_native(),
            format: "JSON".into(),
            message: e.to_string(),
        })?;
        content.push('\n');

        io::write_atomic(path, content.as_bytes())
    }
}

fn check_extension(path: &NormalizedPath) -> Result<()> {
    let extension = path.extension().unwrap_or("");
    if extension.eq_ignore_ascii_case("json") {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat {
            extension: extension.to_string(),
        })
    }
}
