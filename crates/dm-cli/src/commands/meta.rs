//! Metadata commands

use std::path::{Path, PathBuf};

use colored::Colorize;
use dm_core::{DataManager, GetMode, MergeMode, SaveMeta};

use super::parse_json_object;
use crate::context::{Context, path_or_cwd};
use crate::error::{CliError, Result};

/// Container of `path` and the item inside it, `None` for the container.
fn split(dm: &DataManager, path: Option<&Path>) -> Result<(PathBuf, Option<PathBuf>)> {
    let path = dm.resolve_path(&path_or_cwd(path)?)?;
    if dm.engine().is_installed(&path) {
        return Ok((path, None));
    }
    let (container, _) = dm.locate(&path).ok_or_else(|| {
        CliError::user(format!("{} is not inside a container of the tree", path.display()))
    })?;
    Ok((container, Some(path)))
}

/// Run the meta get command
pub fn run_meta_get(ctx: &Context, path: Option<&Path>, payload: bool) -> Result<()> {
    let dm = ctx.open()?;
    let (container, item) = split(&dm, path)?;
    let mode = if payload { GetMode::Payload } else { GetMode::Envelope };
    let record = dm.load_meta(&container, item.as_deref(), mode)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Run the meta set command
pub fn run_meta_set(
    ctx: &Context,
    path: Option<&Path>,
    data: Option<&str>,
    name: Option<&str>,
    merge: bool,
    commit: bool,
) -> Result<()> {
    let payload = data.map(parse_json_object).transpose()?;
    let dm = ctx.open()?;
    let (container, item) = split(&dm, path)?;
    let key = dm.save_meta(&SaveMeta {
        path: item.as_deref(),
        name,
        payload: payload.as_ref(),
        mode: if merge { MergeMode::Merge } else { MergeMode::Overwrite },
        commit,
        ..SaveMeta::new(&container)
    })?;
    println!(
        "{} Metadata for {} in {}",
        "✓".green(),
        key.cyan(),
        container.display()
    );
    Ok(())
}
