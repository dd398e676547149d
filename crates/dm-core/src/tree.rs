//! Provisioning of the root/project/campaign/experiment tree
//!
//! Every level is a container registered in its parent and stamped with a
//! metadata record naming it and its role.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dm_fs::{NodeLevel, classify, key_segments, relative_key};
use dm_git::StorageEngine;

use crate::config::DataManagerConfig;
use crate::log::Logger;
use crate::metadata::{AddMetadata, MetadataStore};
use crate::{Error, Result};

/// Check that `name` is usable as a single tree level.
pub fn validate_level_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid("must be a single path segment")),
    }
}

/// Creates containers and keeps the tree registered.
pub struct TreeProvisioner<'a> {
    engine: &'a Arc<dyn StorageEngine>,
    config: &'a DataManagerConfig,
    log: &'a Logger,
}

impl<'a> TreeProvisioner<'a> {
    pub fn new(engine: &'a Arc<dyn StorageEngine>, config: &'a DataManagerConfig, log: &'a Logger) -> Self {
        Self { engine, config, log }
    }

    /// Make sure a container exists at `path`.
    ///
    /// An installed container is only (re)registered with `parent` when
    /// configured to. A new one is created, registered, and stamped with a
    /// metadata record; `force` leaves that record uncommitted. Returns
    /// whether a container was created.
    pub fn ensure_container(
        &self,
        path: &Path,
        name: &str,
        parent: Option<&Path>,
        force: bool,
    ) -> Result<bool> {
        if self.engine.is_installed(path) {
            if let Some(parent) = parent
                && self.config.register_existing
            {
                self.engine
                    .register_subdataset(parent, path)
                    .map_err(|e| registration_failed(parent, path, e))?;
            }
            tracing::debug!(path = %path.display(), "Container already installed");
            return Ok(false);
        }

        let options = self.config.create_options(force);
        match parent {
            None => self.engine.create(path, None, &options)?,
            Some(parent) => {
                self.engine.update(parent, None, false)?;
                if let Err(e) = self.engine.create(path, Some(parent), &options) {
                    // created but not registered
                    if self.engine.is_installed(path) {
                        return Err(registration_failed(parent, path, e));
                    }
                    return Err(e.into());
                }
                self.engine.save(parent, None, false)?;
            }
        }
        self.log.debug(format!("Created container {}", path.display()));

        let mut store = MetadataStore::new(
            Arc::clone(self.engine),
            &self.config.dm_root,
            self.config.identity.clone(),
            self.config.extractor.clone(),
        );
        store.add(&AddMetadata {
            name: Some(name),
            ..AddMetadata::container(path)
        })?;
        store.save(path)?;
        if !force {
            self.engine
                .save(path, Some(&format!("Metadata for {}", path.display())), false)?;
        }
        Ok(true)
    }

    /// Ensure the root and the given levels exist, each registered in its
    /// parent. Returns the experiment container when one was named.
    ///
    /// Levels must be given top-down: a campaign needs a project and an
    /// experiment needs a campaign.
    pub fn init_tree(
        &self,
        project: Option<&str>,
        campaign: Option<&str>,
        experiment: Option<&str>,
        force: bool,
    ) -> Result<Option<PathBuf>> {
        if campaign.is_some() && project.is_none() {
            return Err(Error::IncompleteTreePath {
                level: "project".to_string(),
            });
        }
        if experiment.is_some() && campaign.is_none() {
            return Err(Error::IncompleteTreePath {
                level: "campaign".to_string(),
            });
        }
        for name in [project, campaign, experiment].into_iter().flatten() {
            validate_level_name(name)?;
        }

        let root = &self.config.dm_root;
        let mut created = self.ensure_container(root, &self.config.identity.name, None, force)?;

        let mut chain = vec![root.clone()];
        let mut parent = root.clone();
        let mut experiment_path = None;
        for (level, name) in [
            (NodeLevel::Project, project),
            (NodeLevel::Campaign, campaign),
            (NodeLevel::Experiment, experiment),
        ] {
            let Some(name) = name else { break };
            let path = parent.join(name);
            created |= self.ensure_container(&path, name, Some(&parent), force)?;
            if level == NodeLevel::Experiment {
                experiment_path = Some(path.clone());
            }
            chain.push(path.clone());
            parent = path;
        }

        if force {
            self.engine.save(root, None, true)?;
        } else if created {
            // children committed after their parents recorded them
            for ancestor in chain.iter().rev().skip(1) {
                self.engine.save(ancestor, None, false)?;
            }
        }

        self.log.info(format!(
            "Initialized tree at {} for {}",
            parent.display(),
            [project, campaign, experiment]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join("/")
        ));
        Ok(experiment_path)
    }

    /// Create the next level below `at`, which must be the root, a project
    /// or a campaign. Returns the new container.
    pub fn create_child(&self, at: &Path, name: &str) -> Result<PathBuf> {
        validate_level_name(name)?;
        let root = &self.config.dm_root;
        let level = classify(at, root).map_err(|_| Error::OutsideManagedRoot {
            path: at.to_path_buf(),
            root: root.clone(),
        })?;
        let key = relative_key(root, at)?;
        let segments = key_segments(&key);

        match level {
            NodeLevel::Root => self.init_tree(Some(name), None, None, false)?,
            NodeLevel::Project => self.init_tree(Some(segments[0]), Some(name), None, false)?,
            NodeLevel::Campaign => {
                self.init_tree(Some(segments[0]), Some(segments[1]), Some(name), false)?
            }
            NodeLevel::Experiment | NodeLevel::Category => {
                return Err(Error::NotAllowedAtLevel {
                    operation: "create a child container".to_string(),
                    level: level.as_str().to_string(),
                });
            }
        };
        Ok(at.join(name))
    }
}

fn registration_failed(parent: &Path, child: &Path, source: dm_git::Error) -> Error {
    Error::RegistrationFailed {
        parent: parent.to_path_buf(),
        child: child.to_path_buf(),
        reason: source.to_string(),
    }
}
