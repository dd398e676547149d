//! Storage engine trait and the values that cross it
//!
//! The data manager never talks to version control directly. Everything it
//! needs from the storage layer goes through [`StorageEngine`], so the core
//! can run against the git-backed engine or an in-process double.

use std::path::{Path, PathBuf};

use crate::Result;

/// Options for creating a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Configuration profile applied to the new container (e.g. `text2git`).
    pub profile: Option<String>,

    /// Create even when the directory already has content.
    pub force: bool,
}

/// How much content a push transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataPolicy {
    /// History and all file content.
    Anything,
    /// History only.
    Nothing,
    /// Let the engine decide.
    #[default]
    Auto,
}

/// Whether removal may bypass the engine's safety checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Removal {
    /// Refuse when something would be lost.
    #[default]
    Safe,
    /// Remove without checking for unsaved or unpublished content.
    Reckless,
}

/// What to do when a sibling with the requested name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingPolicy {
    /// Leave the existing sibling untouched.
    #[default]
    Skip,
    /// Fail.
    Error,
    /// Point the existing sibling at the (re)created repository.
    Reconfigure,
    /// Recreate the remote repository and point the sibling at it.
    Replace,
}

/// Protocol a sibling uses to reach the remote repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessProtocol {
    /// Fetch over HTTPS, push over SSH.
    #[default]
    HttpsSsh,
    Https,
    Ssh,
}

impl AccessProtocol {
    /// Get the string representation of the protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpsSsh => "https-ssh",
            Self::Https => "https",
            Self::Ssh => "ssh",
        }
    }
}

impl std::str::FromStr for AccessProtocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "https-ssh" => Ok(Self::HttpsSsh),
            "https" => Ok(Self::Https),
            "ssh" => Ok(Self::Ssh),
            other => Err(format!("unknown access protocol '{other}'")),
        }
    }
}

impl std::fmt::Display for AccessProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named remote publishing target configured on a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sibling {
    pub name: String,
    pub url: String,
    /// Container the sibling is configured on.
    pub path: PathBuf,
}

/// Request to create or reconfigure a sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingRequest {
    /// Name of the remote repository for the target container.
    pub repo_name: String,
    /// Name of the sibling (remote) inside the container.
    pub name: String,
    pub access_protocol: AccessProtocol,
    /// Name of the stored credential used to reach the host.
    pub credential: Option<String>,
    pub private: bool,
    pub existing: ExistingPolicy,
    /// Also configure every installed subdataset.
    pub recursive: bool,
}

/// A subdataset registered in a parent container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdataset {
    /// Absolute path of the subdataset.
    pub path: PathBuf,
    /// Key of the subdataset relative to the parent.
    pub key: String,
    pub url: Option<String>,
    /// Engine-specific URL record (`datalad-url`).
    pub engine_url: Option<String>,
    pub installed: bool,
}

/// Change state of a path in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Modified,
    Deleted,
    Renamed,
    TypeChanged,
    Untracked,
    Conflicted,
}

impl EntryState {
    /// Get the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
            Self::TypeChanged => "typechange",
            Self::Untracked => "untracked",
            Self::Conflicted => "conflicted",
        }
    }
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A changed path reported by [`StorageEngine::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Absolute path of the changed item.
    pub path: PathBuf,
    pub state: EntryState,
}

/// Contract for the version-controlled, content-addressable storage layer.
///
/// All paths are absolute. Operations block until the engine is done,
/// including network transfer.
pub trait StorageEngine: Send + Sync {
    /// Whether `path` is the root of an installed container.
    fn is_installed(&self, path: &Path) -> bool;

    /// Create a container at `path`.
    ///
    /// With a `parent`, the new container is registered in it as well.
    fn create(&self, path: &Path, parent: Option<&Path>, options: &CreateOptions) -> Result<()>;

    /// Record the current state of `path` (a container root or a path inside one).
    fn save(&self, path: &Path, message: Option<&str>, recursive: bool) -> Result<()>;

    /// Clone the container at `source` (a URL or path) into `dest`.
    fn clone_dataset(&self, source: &str, dest: &Path) -> Result<()>;

    /// Push `container` to the sibling `to`.
    fn push(&self, container: &Path, to: &str, recursive: bool, data: DataPolicy) -> Result<()>;

    /// Fetch from a sibling and merge. Picks a sibling when none is named.
    ///
    /// Recursive updates also install registered subdatasets that are
    /// missing locally.
    fn update(&self, container: &Path, sibling: Option<&str>, recursive: bool) -> Result<()>;

    /// Make file content under `path` available locally.
    fn get_content(&self, container: &Path, path: Option<&Path>, recursive: bool) -> Result<()>;

    /// Drop local file content that can be retrieved again.
    fn drop_content(&self, container: &Path, path: Option<&Path>, recursive: bool) -> Result<()>;

    /// Remove `path` (or the container itself) from the tree and from disk.
    fn remove(&self, container: &Path, path: Option<&Path>, recursive: bool, removal: Removal) -> Result<()>;

    /// Register `child` as a subdataset of `parent`. Re-registering is a no-op.
    fn register_subdataset(&self, parent: &Path, child: &Path) -> Result<()>;

    /// Whether `child` is registered in `parent`.
    fn is_registered(&self, parent: &Path, child: &Path) -> Result<bool>;

    /// Subdatasets registered directly in `container`.
    fn subdatasets(&self, container: &Path) -> Result<Vec<Subdataset>>;

    /// Rewrite the URL records of `child` in `parent`.
    fn set_subdataset_urls(&self, parent: &Path, child: &Path, url: &str, engine_url: &str) -> Result<()>;

    /// Siblings of `container`, optionally filtered by name and recursing
    /// into installed subdatasets.
    fn query_siblings(&self, container: &Path, name: Option<&str>, recursive: bool) -> Result<Vec<Sibling>>;

    /// Create or reconfigure a sibling according to `request.existing`.
    fn create_sibling(&self, container: &Path, request: &SiblingRequest) -> Result<()>;

    /// Remove the sibling `name`. A missing sibling is not an error.
    fn remove_sibling(&self, container: &Path, name: &str, recursive: bool) -> Result<()>;

    /// Stable identifier of the container.
    fn id(&self, container: &Path) -> Result<String>;

    /// Current version of the container, committing once if history is empty.
    fn version(&self, container: &Path) -> Result<String>;

    /// Paths with unsaved changes.
    fn status(&self, container: &Path, recursive: bool) -> Result<Vec<StatusEntry>>;
}
