//! Filesystem layer for the data manager
//!
//! Provides normalized paths and relative-path keys, atomic I/O with
//! advisory locking, a JSON document store and detection of the
//! root/project/campaign/experiment/category tree layout.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use config::ConfigStore;
pub use constants::DmPath;
pub use error::{Error, Result};
pub use layout::{
    EntryKind, NodeLevel, classify, classify_entry, find_container_and_relative,
    is_container_dir,
};
pub use path::{NormalizedPath, SELF_KEY, canonical, expand_user, key_segments, relative_key};
