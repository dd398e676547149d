//! Data tree layout detection
//!
//! The managed tree nests containers as
//! `root/project/campaign/experiment/category/...`. These helpers classify
//! a path by its depth below the managed root and find the nearest
//! enclosing container on disk. They are purely filesystem based and never
//! consult the storage engine.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{DmPath, Result, key_segments, relative_key};

/// Position of a path in the managed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLevel {
    Root,
    Project,
    Campaign,
    Experiment,
    /// A category directory or anything nested below one.
    Category,
}

impl NodeLevel {
    /// Get the string representation of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Project => "project",
            Self::Campaign => "campaign",
            Self::Experiment => "experiment",
            Self::Category => "category",
        }
    }

    /// The level of a direct child, saturating at [`NodeLevel::Category`].
    pub fn child(&self) -> Self {
        match self {
            Self::Root => Self::Project,
            Self::Project => Self::Campaign,
            Self::Campaign => Self::Experiment,
            Self::Experiment | Self::Category => Self::Category,
        }
    }
}

impl std::fmt::Display for NodeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a directory entry looks like to a tree browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory carrying the container marker.
    Dataset,
    /// A plain directory.
    Folder,
    /// A regular file, or a link whose target is present.
    FileLocal,
    /// A link whose target is missing (content not fetched yet).
    FileRemote,
    Other,
}

/// Classify `path` by its depth below `root`.
///
/// Segment 0 is the project, 1 the campaign, 2 the experiment and 3 the
/// category. Anything deeper stays at category level.
pub fn classify(path: &Path, root: &Path) -> Result<NodeLevel> {
    let key = relative_key(root, path)?;
    let level = match key_segments(&key).len() {
        0 => NodeLevel::Root,
        1 => NodeLevel::Project,
        2 => NodeLevel::Campaign,
        3 => NodeLevel::Experiment,
        _ => NodeLevel::Category,
    };
    Ok(level)
}

/// Whether `dir` carries a container marker.
pub fn is_container_dir(dir: &Path) -> bool {
    dir.join(DmPath::DataladDir).is_dir() || dir.join(DmPath::GitDir).exists()
}

/// Find the nearest container enclosing `path` and the key of `path` in it.
///
/// Starts at `path` when it is a directory, else at its parent, and climbs
/// until a container marker is found. The search gives up after examining
/// the managed root's parent or the filesystem root. Returns `None` when
/// `path` does not exist or no container encloses it. When `path` is itself
/// a container root the key is `"."`.
pub fn find_container_and_relative(path: &Path, managed_root: &Path) -> Option<(PathBuf, String)> {
    let path = std::path::absolute(path).ok()?;
    if fs::symlink_metadata(&path).is_err() {
        return None;
    }

    let search_from = if path.is_dir() {
        path.clone()
    } else {
        path.parent()?.to_path_buf()
    };
    let root_parent = managed_root.parent();

    let mut current = search_from.as_path();
    loop {
        if is_container_dir(current) {
            let key = relative_key(current, &path).ok()?;
            return Some((current.to_path_buf(), key));
        }
        if current == managed_root || Some(current) == root_parent {
            break;
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    tracing::debug!(path = %path.display(), "No enclosing container found");
    None
}

/// Classify a directory entry for presentation.
pub fn classify_entry(path: &Path) -> EntryKind {
    let is_symlink = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);

    if path.is_dir() {
        if is_container_dir(path) {
            EntryKind::Dataset
        } else {
            EntryKind::Folder
        }
    } else if path.is_file() {
        // follows links, so a link with a present target lands here too
        EntryKind::FileLocal
    } else if is_symlink {
        EntryKind::FileRemote
    } else {
        EntryKind::Other
    }
}
