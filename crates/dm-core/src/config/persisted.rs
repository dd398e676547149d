//! The persisted configuration document and where it lives

use std::path::PathBuf;

use dm_fs::{ConfigStore, NormalizedPath, expand_user};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable overriding the document location.
pub const CONFIG_ENV_VAR: &str = "ROADMAP_DM_CONFIG";

const APP_DIR: &str = "roadmap-datamanager";
const FALLBACK_DIR: &str = ".roadmap_datamanager";
const FILE_NAME: &str = "config.json";

/// The JSON document remembered between sessions.
///
/// Every key is written, unset values as `null`, and every key may be
/// missing when read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedConfig {
    pub dm_root: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub default_project: Option<String>,
    pub default_campaign: Option<String>,
    #[serde(rename = "GIN_url")]
    pub gin_url: Option<String>,
    #[serde(rename = "GIN_repo")]
    pub gin_repo: Option<String>,
    #[serde(rename = "GIN_user")]
    pub gin_user: Option<String>,
}

impl PersistedConfig {
    /// Whether nothing has been persisted yet.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Resolves and accesses the persisted document.
#[derive(Debug, Clone, Default)]
pub struct ConfigLocation {
    /// Explicit path, used by tests and the CLI `--config` flag.
    override_path: Option<PathBuf>,
}

impl ConfigLocation {
    /// Resolve the location from the environment and platform directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit document path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            override_path: Some(path.into()),
        }
    }

    /// Path of the document.
    pub fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.override_path {
            return Ok(expand_user(path));
        }
        if let Ok(value) = std::env::var(CONFIG_ENV_VAR)
            && !value.is_empty()
        {
            return Ok(expand_user(value));
        }
        if let Some(dir) = dirs::config_dir() {
            return Ok(dir.join(APP_DIR).join(FILE_NAME));
        }
        dirs::home_dir()
            .map(|home| home.join(FALLBACK_DIR).join(FILE_NAME))
            .ok_or_else(|| Error::ConfigurationMissing {
                field: "configuration location".to_string(),
            })
    }

    /// Load the document. A missing document (or a directory in its place)
    /// reads as empty.
    pub fn load(&self) -> Result<PersistedConfig> {
        let path = NormalizedPath::new(self.path()?);
        Ok(ConfigStore::new().load_or_default(&path)?)
    }

    /// Write the document atomically, creating parent directories.
    pub fn save(&self, config: &PersistedConfig) -> Result<PathBuf> {
        let path = self.path()?;
        ConfigStore::new().save(&NormalizedPath::new(&path), config)?;
        tracing::debug!(path = %path.display(), "Saved configuration");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_uses_gin_key_names() {
        let config = PersistedConfig {
            gin_repo: Some("lab".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["GIN_repo"], json!("lab"));
        assert_eq!(value["dm_root"], json!(null));
        assert_eq!(value.as_object().unwrap().len(), 8);
    }

    #[test]
    fn missing_keys_read_as_unset() {
        let config: PersistedConfig = serde_json::from_value(json!({"user_name": "Alice"})).unwrap();
        assert_eq!(config.user_name.as_deref(), Some("Alice"));
        assert!(config.user_email.is_none());
        assert!(!config.is_empty());
    }
}
