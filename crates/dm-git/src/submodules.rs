//! `.gitmodules` records of registered subdatasets
//!
//! Each subdataset is recorded under `submodule.<key>` with `path`, `url`,
//! `datalad-id` and, once published, `datalad-url`.

use std::fs;
use std::path::{Path, PathBuf};

use git2::Config;

use dm_fs::DmPath;

use crate::{Error, Result};

const FIELDS: [&str; 4] = ["path", "url", "datalad-id", "datalad-url"];

fn modules_path(container: &Path) -> PathBuf {
    container.join(DmPath::Gitmodules)
}

fn var(key: &str, field: &str) -> String {
    format!("submodule.{key}.{field}")
}

/// Open `.gitmodules`, creating an empty one when asked.
fn open(container: &Path, create: bool) -> Result<Option<Config>> {
    let path = modules_path(container);
    if !path.is_file() {
        if !create {
            return Ok(None);
        }
        fs::write(&path, "").map_err(|e| Error::io(&path, e))?;
    }
    Ok(Some(Config::open(&path)?))
}

/// Record the subdataset at `key`. An existing `url` is kept.
pub fn record(container: &Path, key: &str, id: &str) -> Result<()> {
    let Some(mut config) = open(container, true)? else {
        return Ok(());
    };
    config.set_str(&var(key, "path"), key)?;
    if config.get_string(&var(key, "url")).is_err() {
        config.set_str(&var(key, "url"), &format!("./{key}"))?;
    }
    config.set_str(&var(key, "datalad-id"), id)?;
    Ok(())
}

/// Overwrite the URL records of the subdataset at `key`.
pub fn set_urls(container: &Path, key: &str, url: &str, engine_url: &str) -> Result<()> {
    let Some(mut config) = open(container, true)? else {
        return Ok(());
    };
    config.set_str(&var(key, "url"), url)?;
    config.set_str(&var(key, "datalad-url"), engine_url)?;
    Ok(())
}

/// The `datalad-url` record of the subdataset at `key`.
pub fn engine_url(container: &Path, key: &str) -> Result<Option<String>> {
    let Some(config) = open(container, false)? else {
        return Ok(None);
    };
    Ok(config.get_string(&var(key, "datalad-url")).ok())
}

/// Drop every record of the subdataset at `key`.
pub fn forget(container: &Path, key: &str) -> Result<()> {
    let Some(mut config) = open(container, false)? else {
        return Ok(());
    };
    for field in FIELDS {
        // absent fields are fine
        let _ = config.remove(&var(key, field));
    }
    Ok(())
}
