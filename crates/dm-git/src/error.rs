//! Error types for dm-git

use std::path::PathBuf;

/// Result type for dm-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in storage engine operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] dm_fs::Error),

    #[error("No container installed at {path}")]
    NotInstalled { path: PathBuf },

    #[error("A container is already installed at {path}")]
    AlreadyInstalled { path: PathBuf },

    #[error("Directory {path} is not empty (use force to create anyway)")]
    NotEmpty { path: PathBuf },

    #[error("Path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Cannot register {path} as a subdataset of itself")]
    SelfRegistration { path: PathBuf },

    #[error("HEAD of {path} is detached")]
    DetachedHead { path: PathBuf },

    #[error("Unknown configuration profile '{name}'")]
    UnknownProfile { name: String },

    #[error("{child} is not registered as a subdataset of {parent}")]
    NotRegistered { parent: PathBuf, child: PathBuf },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Sibling '{name}' already exists on {path}")]
    SiblingExists { name: String, path: PathBuf },

    #[error("No repository host configured; cannot create sibling '{name}'")]
    NoHost { name: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("Merge conflict: {message}")]
    MergeConflict { message: String },

    #[error("Operation '{operation}' not supported by the {engine} engine. {hint}")]
    Unsupported {
        operation: String,
        engine: String,
        hint: String,
    },

    #[error("{path} has unsaved changes")]
    UnsavedChanges { path: PathBuf },

    #[error("{path} has content not available from any sibling")]
    NotAvailableElsewhere { path: PathBuf },

    #[error("{path} contains subdatasets; remove recursively")]
    HasSubdatasets { path: PathBuf },

    #[error("Invalid repository URL: {url}")]
    InvalidUrl { url: String },

    /// Failure reported by an engine implementation outside this crate.
    #[error("Storage engine error: {message}")]
    Engine { message: String },
}

impl Error {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs(dm_fs::Error::io(path, source))
    }
}
