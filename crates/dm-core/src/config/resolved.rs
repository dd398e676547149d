//! Effective configuration after merging overrides, document and defaults

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use dm_fs::{canonical, expand_user};
use dm_git::{CreateOptions, Identity};

use super::PersistedConfig;
use crate::{Error, Result};

/// Configuration profile applied to new containers unless overridden.
pub const DEFAULT_PROFILE: &str = "text2git";

/// URL root of the default remote archive.
pub const DEFAULT_REMOTE_URL: &str = "git@gin.g-node.org:/";

/// Name and version recorded as the producer of metadata records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    pub name: String,
    pub version: String,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            name: "datamanager_v1".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// Remote archive settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSettings {
    /// URL root, e.g. `git@gin.g-node.org:/` or a local directory.
    pub url: Option<String>,
    /// Repository name used for the root container.
    pub repo: Option<String>,
    pub user: Option<String>,
}

impl RemoteSettings {
    /// URL root, falling back to the default archive.
    pub fn url_or_default(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_REMOTE_URL)
    }
}

/// Values supplied explicitly by the caller. Unset fields fall back to the
/// persisted document, then to defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dm_root: Option<PathBuf>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub default_project: Option<String>,
    pub default_campaign: Option<String>,
    pub remote: RemoteSettings,
    /// `Some(None)` disables profiles for new containers.
    pub profile: Option<Option<String>>,
    pub extractor: Option<Extractor>,
    pub verbose: Option<bool>,
    pub register_existing: Option<bool>,
    pub env: HashMap<String, String>,
}

/// The effective configuration of a data manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataManagerConfig {
    /// Absolute, canonical root of the managed tree.
    pub dm_root: PathBuf,
    pub identity: Identity,
    pub default_project: Option<String>,
    pub default_campaign: Option<String>,
    /// Profile applied to new containers.
    pub profile: Option<String>,
    pub extractor: Extractor,
    /// Pass info events to the log sink.
    pub verbose: bool,
    /// Register already installed containers with their parent.
    pub register_existing: bool,
    /// Environment overrides handed to the storage engine.
    pub env: HashMap<String, String>,
    pub remote: RemoteSettings,
}

impl DataManagerConfig {
    /// Merge `overrides` over `persisted` over defaults.
    ///
    /// The root defaults to the current directory; it is created when
    /// missing and canonicalized. A missing identity is an error.
    pub fn resolve(overrides: &ConfigOverrides, persisted: &PersistedConfig) -> Result<Self> {
        let pick = |explicit: &Option<String>, stored: &Option<String>| {
            explicit.clone().or_else(|| stored.clone())
        };

        let user_name = pick(&overrides.user_name, &persisted.user_name).ok_or_else(|| {
            Error::ConfigurationMissing {
                field: "user_name".to_string(),
            }
        })?;
        let user_email = pick(&overrides.user_email, &persisted.user_email).ok_or_else(|| {
            Error::ConfigurationMissing {
                field: "user_email".to_string(),
            }
        })?;

        let root = overrides
            .dm_root
            .clone()
            .or_else(|| persisted.dm_root.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        let root = expand_user(root);
        fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
        let dm_root = canonical(&root)?;

        Ok(Self {
            dm_root,
            identity: Identity::new(user_name, user_email),
            default_project: pick(&overrides.default_project, &persisted.default_project),
            default_campaign: pick(&overrides.default_campaign, &persisted.default_campaign),
            profile: overrides
                .profile
                .clone()
                .unwrap_or_else(|| Some(DEFAULT_PROFILE.to_string())),
            extractor: overrides.extractor.clone().unwrap_or_default(),
            verbose: overrides.verbose.unwrap_or(true),
            register_existing: overrides.register_existing.unwrap_or(true),
            env: overrides.env.clone(),
            remote: RemoteSettings {
                url: pick(&overrides.remote.url, &persisted.gin_url),
                repo: pick(&overrides.remote.repo, &persisted.gin_repo),
                user: pick(&overrides.remote.user, &persisted.gin_user),
            },
        })
    }

    /// The persistable part of the configuration.
    pub fn to_persisted(&self) -> PersistedConfig {
        PersistedConfig {
            dm_root: Some(self.dm_root.to_string_lossy().into_owned()),
            user_name: Some(self.identity.name.clone()),
            user_email: Some(self.identity.email.clone()),
            default_project: self.default_project.clone(),
            default_campaign: self.default_campaign.clone(),
            gin_url: self.remote.url.clone(),
            gin_repo: self.remote.repo.clone(),
            gin_user: self.remote.user.clone(),
        }
    }

    /// Environment for storage engine processes: the overrides, with
    /// interactive git prompts disabled unless set explicitly.
    pub fn process_env(&self) -> HashMap<String, String> {
        let mut env = self.env.clone();
        env.entry("GIT_TERMINAL_PROMPT".to_string())
            .or_insert_with(|| "0".to_string());
        env
    }

    /// Options for creating containers.
    pub fn create_options(&self, force: bool) -> CreateOptions {
        CreateOptions {
            profile: self.profile.clone(),
            force,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn persisted(root: &std::path::Path) -> PersistedConfig {
        PersistedConfig {
            dm_root: Some(root.to_string_lossy().into_owned()),
            user_name: Some("Persisted".to_string()),
            user_email: Some("p@x.org".to_string()),
            default_project: Some("roadmap".to_string()),
            gin_repo: Some("lab".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn explicit_values_win_over_persisted() {
        let temp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            user_name: Some("Alice".to_string()),
            ..Default::default()
        };

        let config = DataManagerConfig::resolve(&overrides, &persisted(temp.path())).unwrap();

        assert_eq!(config.identity.name, "Alice");
        assert_eq!(config.identity.email, "p@x.org");
        assert_eq!(config.default_project.as_deref(), Some("roadmap"));
        assert_eq!(config.remote.repo.as_deref(), Some("lab"));
        assert_eq!(config.profile.as_deref(), Some(DEFAULT_PROFILE));
        assert_eq!(config.extractor, Extractor::default());
        assert!(config.verbose);
    }

    #[test]
    fn missing_identity_is_reported() {
        let temp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            dm_root: Some(temp.path().to_path_buf()),
            user_name: Some("Alice".to_string()),
            ..Default::default()
        };

        let result = DataManagerConfig::resolve(&overrides, &PersistedConfig::default());
        assert!(matches!(
            result,
            Err(Error::ConfigurationMissing { field }) if field == "user_email"
        ));
    }

    #[test]
    fn root_is_created_and_canonical() {
        let temp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            dm_root: Some(temp.path().join("a/../dm")),
            ..Default::default()
        };

        let config = DataManagerConfig::resolve(&overrides, &persisted(temp.path())).unwrap();

        assert!(config.dm_root.is_dir());
        assert_eq!(config.dm_root, canonical(temp.path()).unwrap().join("dm"));
    }

    #[test]
    fn process_env_disables_prompts_by_default() {
        let temp = TempDir::new().unwrap();
        let mut overrides = ConfigOverrides::default();
        let config = DataManagerConfig::resolve(&overrides, &persisted(temp.path())).unwrap();
        assert_eq!(config.process_env()["GIT_TERMINAL_PROMPT"], "0");

        overrides
            .env
            .insert("GIT_TERMINAL_PROMPT".to_string(), "1".to_string());
        let config = DataManagerConfig::resolve(&overrides, &persisted(temp.path())).unwrap();
        assert_eq!(config.process_env()["GIT_TERMINAL_PROMPT"], "1");
    }

    #[test]
    fn persisted_round_trip_keeps_remote() {
        let temp = TempDir::new().unwrap();
        let config =
            DataManagerConfig::resolve(&ConfigOverrides::default(), &persisted(temp.path())).unwrap();
        let document = config.to_persisted();
        assert_eq!(document.gin_repo.as_deref(), Some("lab"));
        assert_eq!(document.user_name.as_deref(), Some("Persisted"));
    }
}
