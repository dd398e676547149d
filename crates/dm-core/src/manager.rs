//! The data manager facade

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dm_fs::{EntryKind, NodeLevel, canonical, classify, classify_entry, expand_user, find_container_and_relative};
use dm_git::{Removal, StatusEntry, StorageEngine};
use serde_json::{Map, Value};

use crate::config::{ConfigLocation, ConfigOverrides, DataManagerConfig};
use crate::install::{InstallEngine, InstallRequest};
use crate::log::{LogSink, Logger};
use crate::metadata::{AddMetadata, GetMode, MergeMode, MetadataStore};
use crate::remote::{PublishRequest, RemoteSyncManager};
use crate::tree::TreeProvisioner;
use crate::{Error, Result};

/// A metadata write through the facade.
#[derive(Debug, Clone, Copy)]
pub struct SaveMeta<'a> {
    pub container: &'a Path,
    /// Item inside the container, `None` for the container itself.
    pub path: Option<&'a Path>,
    pub name: Option<&'a str>,
    pub payload: Option<&'a Map<String, Value>>,
    pub mode: MergeMode,
    /// Commit the container afterwards.
    pub commit: bool,
}

impl<'a> SaveMeta<'a> {
    pub fn new(container: &'a Path) -> Self {
        Self {
            container,
            path: None,
            name: None,
            payload: None,
            mode: MergeMode::Overwrite,
            commit: true,
        }
    }
}

/// Entry point tying configuration, storage engine and log sink together.
///
/// Operations run synchronously. Callers serialize operations touching the
/// same container.
pub struct DataManager {
    config: DataManagerConfig,
    location: ConfigLocation,
    engine: Arc<dyn StorageEngine>,
    log: Logger,
}

impl DataManager {
    /// Resolve the configuration from `overrides` and the persisted
    /// document, then persist the result.
    pub fn new(
        overrides: &ConfigOverrides,
        location: ConfigLocation,
        engine: Arc<dyn StorageEngine>,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self> {
        let persisted = location.load()?;
        let config = DataManagerConfig::resolve(overrides, &persisted)?;
        let log = Logger::new(sink, config.verbose);

        let saved_at = location.save(&config.to_persisted())?;
        tracing::debug!(path = %saved_at.display(), "Persisted configuration");
        log.info(format!(
            "Data manager at {} for {} <{}>",
            config.dm_root.display(),
            config.identity.name,
            config.identity.email
        ));

        Ok(Self {
            config,
            location,
            engine,
            log,
        })
    }

    /// Build from the persisted document alone.
    pub fn from_persisted(
        location: ConfigLocation,
        engine: Arc<dyn StorageEngine>,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self> {
        if location.load()?.is_empty() {
            return Err(Error::ConfigurationMissing {
                field: "persisted configuration".to_string(),
            });
        }
        Self::new(&ConfigOverrides::default(), location, engine, sink)
    }

    pub fn config(&self) -> &DataManagerConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn StorageEngine> {
        &self.engine
    }

    pub fn logger(&self) -> &Logger {
        &self.log
    }

    /// Write the persistable configuration. Returns the document path.
    pub fn save_configuration(&self) -> Result<PathBuf> {
        self.location.save(&self.config.to_persisted())
    }

    /// Update the remote settings given and persist them.
    pub fn set_remote(&mut self, url: Option<&str>, repo: Option<&str>, user: Option<&str>) -> Result<PathBuf> {
        if let Some(url) = url {
            self.config.remote.url = Some(url.to_string());
        }
        if let Some(repo) = repo {
            self.config.remote.repo = Some(repo.to_string());
        }
        if let Some(user) = user {
            self.config.remote.user = Some(user.to_string());
        }
        self.save_configuration()
    }

    /// Update the default project and campaign and persist them.
    pub fn set_defaults(&mut self, project: Option<&str>, campaign: Option<&str>) -> Result<PathBuf> {
        if let Some(project) = project {
            self.config.default_project = Some(project.to_string());
        }
        if let Some(campaign) = campaign {
            self.config.default_campaign = Some(campaign.to_string());
        }
        self.save_configuration()
    }

    /// Absolute form of a caller path, canonical when it exists.
    pub fn resolve_path(&self, path: &Path) -> Result<PathBuf> {
        let expanded = expand_user(path);
        let absolute = std::path::absolute(&expanded).map_err(|e| Error::io(&expanded, e))?;
        if absolute.exists() {
            Ok(canonical(&absolute)?)
        } else {
            Ok(absolute)
        }
    }

    fn tree(&self) -> TreeProvisioner<'_> {
        TreeProvisioner::new(&self.engine, &self.config, &self.log)
    }

    fn remote(&self) -> RemoteSyncManager<'_> {
        RemoteSyncManager::new(&self.engine, &self.config, &self.log)
    }

    fn metadata(&self) -> MetadataStore {
        MetadataStore::new(
            Arc::clone(&self.engine),
            &self.config.dm_root,
            self.config.identity.clone(),
            self.config.extractor.clone(),
        )
    }

    fn require_installed(&self, container: &Path) -> Result<()> {
        if self.engine.is_installed(container) {
            Ok(())
        } else {
            Err(Error::ContainerNotInstalled {
                path: container.to_path_buf(),
            })
        }
    }

    pub fn init_tree(
        &self,
        project: Option<&str>,
        campaign: Option<&str>,
        experiment: Option<&str>,
        force: bool,
    ) -> Result<Option<PathBuf>> {
        self.tree().init_tree(project, campaign, experiment, force)
    }

    pub fn create_child(&self, at: &Path, name: &str) -> Result<PathBuf> {
        let at = self.resolve_path(at)?;
        self.tree().create_child(&at, name)
    }

    pub fn install_into_tree(&self, request: &InstallRequest) -> Result<PathBuf> {
        InstallEngine::new(&self.engine, &self.config, &self.log).install_into_tree(request)
    }

    /// Record metadata and, unless told otherwise, commit the container.
    pub fn save_meta(&self, request: &SaveMeta<'_>) -> Result<String> {
        let container = self.resolve_path(request.container)?;
        let mut store = self.metadata();
        let key = store.add(&AddMetadata {
            container: &container,
            path: request.path,
            payload: request.payload,
            name: request.name,
            mode: request.mode,
        })?;
        store.save(&container)?;
        if request.commit {
            self.engine
                .save(&container, Some(&format!("Metadata for {key}")), false)?;
        }
        Ok(key)
    }

    pub fn load_meta(&self, container: &Path, path: Option<&Path>, mode: GetMode) -> Result<Map<String, Value>> {
        let container = self.resolve_path(container)?;
        self.metadata().get(&container, path, mode)
    }

    pub fn publish_lazy_to_remote(&self, request: &PublishRequest) -> Result<PathBuf> {
        self.remote().publish_lazy_to_remote(&self.resolve_request(request)?)
    }

    pub fn publish_sibling(&self, request: &PublishRequest) -> Result<()> {
        self.remote().publish_sibling(&self.resolve_request(request)?)
    }

    fn resolve_request(&self, request: &PublishRequest) -> Result<PublishRequest> {
        let container = match &request.container {
            Some(path) => Some(self.resolve_path(path)?),
            None => None,
        };
        Ok(PublishRequest {
            container,
            ..request.clone()
        })
    }

    pub fn pull_from_remotes(&self, container: &Path, recursive: bool, sibling: Option<&str>) -> Result<()> {
        let container = self.resolve_path(container)?;
        self.remote().pull_from_remotes(&container, recursive, sibling)
    }

    pub fn push_to_remotes(
        &self,
        container: &Path,
        recursive: bool,
        message: Option<&str>,
        sibling: Option<&str>,
    ) -> Result<()> {
        let container = self.resolve_path(container)?;
        self.remote()
            .push_to_remotes(&container, recursive, message, sibling)
    }

    pub fn remove_siblings(&self, container: &Path, name: &str, recursive: bool) -> Result<()> {
        let container = self.resolve_path(container)?;
        self.remote().remove_siblings(&container, name, recursive)
    }

    pub fn clone_from_remote(
        &self,
        dest: &Path,
        url_root: Option<&str>,
        user: Option<&str>,
        repo: Option<&str>,
    ) -> Result<PathBuf> {
        self.remote().clone_from_remote(dest, url_root, user, repo)
    }

    /// Fetch file content into a container.
    pub fn get_data(&self, container: &Path, path: Option<&Path>, recursive: bool) -> Result<()> {
        let container = self.resolve_path(container)?;
        self.require_installed(&container)?;
        self.engine.get_content(&container, path, recursive)?;
        Ok(())
    }

    /// Release local copies of file content.
    pub fn drop_local(&self, container: &Path, path: Option<&Path>, recursive: bool) -> Result<()> {
        let container = self.resolve_path(container)?;
        self.require_installed(&container)?;
        self.engine.drop_content(&container, path, recursive)?;
        Ok(())
    }

    pub fn remove_from_tree(
        &self,
        container: &Path,
        path: Option<&Path>,
        recursive: bool,
        removal: Removal,
    ) -> Result<()> {
        let container = self.resolve_path(container)?;
        self.require_installed(&container)?;
        self.engine.remove(&container, path, recursive, removal)?;
        if removal == Removal::Reckless {
            self.log.warn(format!(
                "Removed {} without availability checks",
                path.map_or_else(|| container.display().to_string(), |p| p.display().to_string())
            ));
        }
        Ok(())
    }

    /// Changed paths of a container, the root when unset.
    pub fn status(&self, container: Option<&Path>, recursive: bool) -> Result<Vec<StatusEntry>> {
        let container = match container {
            Some(path) => self.resolve_path(path)?,
            None => self.config.dm_root.clone(),
        };
        self.require_installed(&container)?;
        Ok(self.engine.status(&container, recursive)?)
    }

    /// Commit the container at `path`, or only `path` inside the container
    /// enclosing it.
    pub fn save(&self, path: &Path, recursive: bool, message: Option<&str>) -> Result<()> {
        let path = self.resolve_path(path)?;
        if !self.engine.is_installed(&path) {
            let (container, key) = self
                .locate(&path)
                .ok_or_else(|| Error::ContainerNotInstalled { path: path.clone() })?;
            tracing::debug!(container = %container.display(), key = %key, "Saving path in container");
        }
        self.engine.save(&path, message, recursive)?;
        Ok(())
    }

    /// Tree level of `path`.
    pub fn classify(&self, path: &Path) -> Result<NodeLevel> {
        let path = self.resolve_path(path)?;
        classify(&path, &self.config.dm_root).map_err(|_| Error::OutsideManagedRoot {
            path,
            root: self.config.dm_root.clone(),
        })
    }

    /// Presentation kind of the entry at `path`.
    pub fn classify_entry(&self, path: &Path) -> Result<EntryKind> {
        Ok(classify_entry(&self.resolve_path(path)?))
    }

    /// Nearest container enclosing `path` and the key of `path` in it.
    pub fn locate(&self, path: &Path) -> Option<(PathBuf, String)> {
        let path = self.resolve_path(path).ok()?;
        find_container_and_relative(&path, &self.config.dm_root)
    }
}

impl std::fmt::Debug for DataManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataManager")
            .field("config", &self.config)
            .field("location", &self.location)
            .finish()
    }
}
