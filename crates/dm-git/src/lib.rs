//! Storage engine abstraction for the data manager
//!
//! [`StorageEngine`] is the contract the data manager uses for everything
//! version-control related. [`GitEngine`] implements it on top of libgit2.

pub mod engine;
pub mod error;
pub mod git_engine;
pub mod helpers;
pub mod host;
pub mod naming;
pub mod submodules;

pub use engine::{
    AccessProtocol, CreateOptions, DataPolicy, EntryState, ExistingPolicy, Removal, Sibling,
    SiblingRequest, StatusEntry, StorageEngine, Subdataset,
};
pub use error::{Error, Result};
pub use git_engine::{DATASET_ID_KEY, GitEngine, Identity, credential_token_var};
pub use host::{HostedRepository, LocalHost, RepositoryHost, UrlHost, host_for};
pub use naming::{is_valid_repo_name, sanitize_segment, sibling_repo_name, ssh_to_https};

/// Branch new containers and hosted repositories start on.
pub const DEFAULT_BRANCH: &str = "main";
