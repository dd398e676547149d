//! Core orchestration layer for the scientific data manager
//!
//! This crate coordinates the Layer 0 crates to manage a tree of
//! version-controlled containers:
//!
//! - **Tree provisioning**: root, project, campaign and experiment
//!   containers, each registered in its parent
//! - **Installation**: placing files and folders into an experiment's
//!   categories without clobbering existing content
//! - **Metadata**: provenance records keyed by relative path, per container
//! - **Remote sync**: publishing to siblings, pulling and pushing
//!
//! # Architecture
//!
//! `dm-core` sits above the Layer 0 crates and below the CLI:
//!
//! ```text
//!            dm-cli
//!              |
//!           dm-core
//!              |
//!       +------+------+
//!       |             |
//!     dm-fs        dm-git
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dm_core::{ConfigLocation, ConfigOverrides, DataManager, TracingSink};
//! use dm_git::{GitEngine, Identity};
//!
//! fn example() -> dm_core::Result<()> {
//!     let overrides = ConfigOverrides {
//!         user_name: Some("Alice".into()),
//!         user_email: Some("alice@lab.org".into()),
//!         dm_root: Some("/tmp/dm".into()),
//!         ..Default::default()
//!     };
//!     let engine = Arc::new(GitEngine::new(Identity::new("Alice", "alice@lab.org")));
//!     let dm = DataManager::new(&overrides, ConfigLocation::new(), engine, Arc::new(TracingSink))?;
//!     dm.init_tree(Some("roadmap"), Some("2025"), Some("E1"), false)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod install;
pub mod log;
pub mod manager;
pub mod metadata;
pub mod remote;
pub mod tree;

pub use config::{
    CONFIG_ENV_VAR, ConfigLocation, ConfigOverrides, DEFAULT_PROFILE, DEFAULT_REMOTE_URL,
    DataManagerConfig, Extractor, PersistedConfig, RemoteSettings,
};
pub use error::{Error, Result};
pub use install::{ALLOWED_CATEGORIES, Category, InstallEngine, InstallRequest};
pub use log::{LogEvent, LogLevel, LogSink, Logger, MemorySink, TracingSink};
pub use manager::{DataManager, SaveMeta};
pub use metadata::{
    AddMetadata, Envelope, ExtractionParameter, GetMode, MergeMode, MetadataDocument,
    MetadataStore, NodeType, RecordKind,
};
pub use remote::{DEFAULT_SIBLING, PublishRequest, RemoteSyncManager, repository_url};
pub use tree::{TreeProvisioner, validate_level_name};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn errors_name_the_offending_path() {
        let error = Error::ContainerNotInstalled {
            path: PathBuf::from("/tmp/dm/roadmap"),
        };
        assert!(error.to_string().contains("/tmp/dm/roadmap"));

        let error = Error::InvalidCategory {
            category: "raw_data".into(),
            allowed: ALLOWED_CATEGORIES.join(", "),
        };
        assert!(error.to_string().contains("experimental_optimization"));
    }
}
