//! Error types for dm-core

use std::path::PathBuf;

/// Result type for dm-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in data manager operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration value is neither given nor persisted
    #[error("Configuration missing: {field} (set it explicitly or run setup first)")]
    ConfigurationMissing { field: String },

    /// The path is not an installed container
    #[error("No container installed at {path}")]
    ContainerNotInstalled { path: PathBuf },

    /// Category outside the fixed vocabulary
    #[error("Invalid category '{category}', expected one of: {allowed}")]
    InvalidCategory { category: String, allowed: String },

    /// Install source does not exist
    #[error("Source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Install target exists and overwrite was not requested
    #[error("Target already exists: {path}")]
    TargetExists { path: PathBuf },

    /// A path or container lies outside the managed tree
    #[error("{path} is outside the managed root {root}")]
    OutsideManagedRoot { path: PathBuf, root: PathBuf },

    /// Push failed and no fallback sibling exists
    #[error("No publication target configured for {container} and no 'gin' or 'origin' sibling found")]
    NoPublicationTarget { container: PathBuf },

    /// The engine refused to register a child container
    #[error("Failed to register {child} in {parent}: {reason}")]
    RegistrationFailed {
        parent: PathBuf,
        child: PathBuf,
        reason: String,
    },

    /// A tree level needed for the operation was not given
    #[error("Incomplete tree path: no {level} given and no default configured")]
    IncompleteTreePath { level: String },

    /// Install destination is not a path below the category
    #[error("Invalid destination {path}: {reason}")]
    InvalidDestination { path: PathBuf, reason: String },

    /// Operation not permitted at this tree level
    #[error("Cannot {operation} at {level} level")]
    NotAllowedAtLevel { operation: String, level: String },

    /// A container or repository name that cannot be used
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from dm-fs
    #[error(transparent)]
    Fs(#[from] dm_fs::Error),

    /// Storage engine error from dm-git
    #[error(transparent)]
    Engine(#[from] dm_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs(dm_fs::Error::io(path, source))
    }
}
