//! Data manager configuration
//!
//! Configuration comes from three places, in order of precedence:
//!
//! 1. **Explicit overrides** passed by the caller ([`ConfigOverrides`])
//! 2. **Persisted document** at the [`ConfigLocation`]
//! 3. **Built-in defaults**
//!
//! The persisted document is a single JSON object shared by every front-end
//! of the same user. Its location is, in order: an explicit path, the
//! `ROADMAP_DM_CONFIG` environment variable, the platform config directory
//! (`<config_dir>/roadmap-datamanager/config.json`), and finally
//! `~/.roadmap_datamanager/config.json`.

mod persisted;
mod resolved;

pub use persisted::{CONFIG_ENV_VAR, ConfigLocation, PersistedConfig};
pub use resolved::{
    ConfigOverrides, DEFAULT_PROFILE, DEFAULT_REMOTE_URL, DataManagerConfig, Extractor,
    RemoteSettings,
};
