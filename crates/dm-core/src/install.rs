//! Placing external files and folders into an experiment's categories

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use dm_fs::expand_user;
use dm_git::StorageEngine;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::config::DataManagerConfig;
use crate::log::Logger;
use crate::metadata::{AddMetadata, MetadataStore};
use crate::tree::TreeProvisioner;
use crate::{Error, Result};

/// The fixed category vocabulary below an experiment.
pub const ALLOWED_CATEGORIES: [&str; 7] = [
    "raw",
    "reduced",
    "measurement",
    "analysis",
    "template",
    "experimental_optimization",
    "model",
];

/// A category directory below an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Raw,
    Reduced,
    Measurement,
    Analysis,
    Template,
    ExperimentalOptimization,
    Model,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Self::Raw,
        Self::Reduced,
        Self::Measurement,
        Self::Analysis,
        Self::Template,
        Self::ExperimentalOptimization,
        Self::Model,
    ];

    /// Get the directory name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Reduced => "reduced",
            Self::Measurement => "measurement",
            Self::Analysis => "analysis",
            Self::Template => "template",
            Self::ExperimentalOptimization => "experimental_optimization",
            Self::Model => "model",
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidCategory {
                category: s.to_string(),
                allowed: ALLOWED_CATEGORIES.join(", "),
            })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where and how to install a file or folder.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallRequest {
    pub source: PathBuf,
    /// Falls back to the configured default project.
    pub project: Option<String>,
    /// Falls back to the configured default campaign.
    pub campaign: Option<String>,
    pub experiment: String,
    pub category: String,
    /// Subdirectory below the category.
    pub dest_rel: Option<PathBuf>,
    /// Final name, defaults to the source's name.
    pub rename: Option<String>,
    /// Move instead of copy.
    pub move_source: bool,
    /// Extra fields for the item's metadata record.
    pub metadata: Option<Map<String, Value>>,
    /// Replace files and merge into folders that already exist.
    pub overwrite: bool,
}

impl InstallRequest {
    pub fn new(source: impl Into<PathBuf>, experiment: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            project: None,
            campaign: None,
            experiment: experiment.into(),
            category: category.into(),
            dest_rel: None,
            rename: None,
            move_source: false,
            metadata: None,
            overwrite: false,
        }
    }
}

/// Installs content into experiment containers.
pub struct InstallEngine<'a> {
    engine: &'a Arc<dyn StorageEngine>,
    config: &'a DataManagerConfig,
    log: &'a Logger,
}

impl<'a> InstallEngine<'a> {
    pub fn new(engine: &'a Arc<dyn StorageEngine>, config: &'a DataManagerConfig, log: &'a Logger) -> Self {
        Self { engine, config, log }
    }

    /// Copy or move `request.source` into
    /// `<root>/<project>/<campaign>/<experiment>/<category>/<dest_rel>/<name>`,
    /// provisioning the tree on the way, record its metadata in the
    /// experiment and commit. Returns the installed path.
    ///
    /// Everything that can be checked up front is checked before the tree
    /// is touched.
    pub fn install_into_tree(&self, request: &InstallRequest) -> Result<PathBuf> {
        let category: Category = request.category.parse()?;

        // links are followed, so a linked folder installs as a folder
        let source = dm_fs::canonical(&request.source).map_err(|_| Error::SourceNotFound {
            path: expand_user(&request.source),
        })?;
        let source_meta = fs::metadata(&source).map_err(|e| Error::io(&source, e))?;

        if let Some(dest_rel) = &request.dest_rel {
            check_relative(dest_rel)?;
        }
        let name = match &request.rename {
            Some(rename) => {
                check_single_segment(rename)?;
                rename.clone()
            }
            None => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::InvalidDestination {
                    path: source.clone(),
                    reason: "source has no file name".to_string(),
                })?,
        };

        let project = level_or_default(&request.project, &self.config.default_project, "project")?;
        let campaign = level_or_default(&request.campaign, &self.config.default_campaign, "campaign")?;

        let experiment = TreeProvisioner::new(self.engine, self.config, self.log)
            .init_tree(Some(&project), Some(&campaign), Some(&request.experiment), false)?
            .ok_or_else(|| Error::IncompleteTreePath {
                level: "experiment".to_string(),
            })?;

        let mut dest_dir = experiment.join(category.as_str());
        if let Some(dest_rel) = &request.dest_rel {
            dest_dir.push(dest_rel);
        }
        fs::create_dir_all(&dest_dir).map_err(|e| Error::io(&dest_dir, e))?;

        let target = dest_dir.join(&name);
        if let Ok(existing) = fs::symlink_metadata(&target)
            && (!request.overwrite || existing.is_dir() != source_meta.is_dir())
        {
            return Err(Error::TargetExists { path: target });
        }

        if source_meta.is_dir() {
            if request.move_source {
                move_dir(&source, &target)?;
            } else {
                copy_tree(&source, &target)?;
            }
        } else if request.move_source {
            move_file(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(|e| Error::io(&target, e))?;
        }
        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            moved = request.move_source,
            "Installed content"
        );

        let mut store = MetadataStore::new(
            Arc::clone(self.engine),
            &self.config.dm_root,
            self.config.identity.clone(),
            self.config.extractor.clone(),
        );
        let key = store.add(&AddMetadata {
            path: Some(&target),
            payload: request.metadata.as_ref(),
            name: Some(&name),
            ..AddMetadata::container(&experiment)
        })?;
        store.save(&experiment)?;
        self.engine
            .save(&experiment, Some(&format!("Installed {key}")), false)?;

        self.log.info(format!(
            "Installed {} into {}",
            source.display(),
            target.display()
        ));
        Ok(target)
    }
}

fn level_or_default(explicit: &Option<String>, default: &Option<String>, level: &str) -> Result<String> {
    explicit
        .clone()
        .or_else(|| default.clone())
        .ok_or_else(|| Error::IncompleteTreePath {
            level: level.to_string(),
        })
}

fn check_relative(path: &Path) -> Result<()> {
    let valid = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidDestination {
            path: path.to_path_buf(),
            reason: "must be a relative path without '..'".to_string(),
        })
    }
}

fn check_single_segment(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(Error::InvalidDestination {
            path: PathBuf::from(name),
            reason: "rename must be a single file name".to_string(),
        }),
    }
}

/// Copy `source` into `target`, merging with existing content.
fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            Error::io(path, std::io::Error::other(e.to_string()))
        })?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| Error::InvalidDestination {
                path: entry.path().to_path_buf(),
                reason: "escaped the source tree".to_string(),
            })?;
        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| Error::io(&dest, e))?;
        } else {
            fs::copy(entry.path(), &dest).map_err(|e| Error::io(&dest, e))?;
        }
    }
    Ok(())
}

fn move_file(source: &Path, target: &Path) -> Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    // across filesystems
    fs::copy(source, target).map_err(|e| Error::io(target, e))?;
    fs::remove_file(source).map_err(|e| Error::io(source, e))
}

fn move_dir(source: &Path, target: &Path) -> Result<()> {
    if !target.exists() && fs::rename(source, target).is_ok() {
        return Ok(());
    }
    copy_tree(source, target)?;
    fs::remove_dir_all(source).map_err(|e| Error::io(source, e))
}
