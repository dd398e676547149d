//! Content commands: get, drop, remove and save

use std::path::{Path, PathBuf};

use colored::Colorize;
use dm_core::DataManager;
use dm_git::Removal;

use crate::context::{Context, path_or_cwd};
use crate::error::{CliError, Result};
use crate::interactive::confirm_reckless_removal;

/// The container holding `path` and `path` itself unless it is that container.
fn target(dm: &DataManager, path: Option<&Path>) -> Result<(PathBuf, Option<PathBuf>)> {
    let path = dm.resolve_path(&path_or_cwd(path)?)?;
    if dm.engine().is_installed(&path) {
        return Ok((path, None));
    }
    let (container, _) = dm.locate(&path).ok_or_else(|| {
        CliError::user(format!("{} is not inside a container of the tree", path.display()))
    })?;
    Ok((container, Some(path)))
}

/// Run the get command
pub fn run_get(ctx: &Context, path: Option<&Path>, recursive: bool) -> Result<()> {
    let dm = ctx.open()?;
    let (container, item) = target(&dm, path)?;
    dm.get_data(&container, item.as_deref(), recursive)?;
    println!("{} Content available", "✓".green());
    Ok(())
}

/// Run the drop command
pub fn run_drop(ctx: &Context, path: Option<&Path>, recursive: bool) -> Result<()> {
    let dm = ctx.open()?;
    let (container, item) = target(&dm, path)?;
    dm.drop_local(&container, item.as_deref(), recursive)?;
    println!("{} Local content dropped", "✓".green());
    Ok(())
}

/// Run the remove command
///
/// A reckless removal asks for confirmation unless `yes` is set.
pub fn run_remove(ctx: &Context, path: &Path, recursive: bool, reckless: bool, yes: bool) -> Result<()> {
    let dm = ctx.open()?;
    let (container, item) = target(&dm, Some(path))?;
    let removal = if reckless { Removal::Reckless } else { Removal::Safe };

    if removal == Removal::Reckless && !yes {
        let shown = item.as_deref().unwrap_or(&container);
        if !confirm_reckless_removal(shown)? {
            println!("{}", "Aborted".yellow());
            return Ok(());
        }
    }

    dm.remove_from_tree(&container, item.as_deref(), recursive, removal)?;
    println!("{} Removed {}", "✓".green(), path.display());
    Ok(())
}

/// Run the save command
pub fn run_save(ctx: &Context, path: Option<&Path>, message: Option<&str>, recursive: bool) -> Result<()> {
    let dm = ctx.open()?;
    let path = path_or_cwd(path)?;
    dm.save(&path, recursive, message)?;
    println!("{} Saved", "✓".green());
    Ok(())
}
