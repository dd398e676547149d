//! Building a data manager from the persisted configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dm_core::{ConfigLocation, ConfigOverrides, DataManager, DataManagerConfig, TracingSink};
use dm_git::{GitEngine, StorageEngine, host_for};

use crate::error::Result;

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            config_path,
            verbose,
        }
    }

    pub fn location(&self) -> ConfigLocation {
        match &self.config_path {
            Some(path) => ConfigLocation::at(path),
            None => ConfigLocation::new(),
        }
    }

    /// Open a data manager over the persisted configuration.
    pub fn open(&self) -> Result<DataManager> {
        let location = self.location();
        if location.load()?.is_empty() {
            return Err(dm_core::Error::ConfigurationMissing {
                field: "persisted configuration".to_string(),
            }
            .into());
        }
        self.open_with(&ConfigOverrides::default())
    }

    /// Open a data manager with explicit overrides over the persisted
    /// configuration, persisting the result.
    pub fn open_with(&self, overrides: &ConfigOverrides) -> Result<DataManager> {
        let location = self.location();
        let overrides = ConfigOverrides {
            verbose: Some(self.verbose),
            ..overrides.clone()
        };
        let config = DataManagerConfig::resolve(&overrides, &location.load()?)?;
        let engine = build_engine(&config)?;
        Ok(DataManager::new(
            &overrides,
            location,
            engine,
            Arc::new(TracingSink),
        )?)
    }
}

/// The git-backed engine for a resolved configuration.
pub fn build_engine(config: &DataManagerConfig) -> Result<Arc<dyn StorageEngine>> {
    let mut engine = GitEngine::new(config.identity.clone()).with_env(config.process_env());
    if let Some(user) = &config.remote.user {
        engine = engine.with_host(host_for(config.remote.url_or_default(), user)?);
    }
    Ok(Arc::new(engine))
}

/// `path` when given, else the current directory.
pub fn path_or_cwd(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}

/// The container enclosing `path` (or the current directory), falling back
/// to the managed root.
pub fn container_or_default(dm: &DataManager, path: Option<&Path>) -> Result<PathBuf> {
    let path = dm.resolve_path(&path_or_cwd(path)?)?;
    if dm.engine().is_installed(&path) {
        return Ok(path);
    }
    Ok(dm
        .locate(&path)
        .map(|(container, _)| container)
        .unwrap_or_else(|| dm.config().dm_root.clone()))
}
