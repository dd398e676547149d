//! Status and classify commands

use std::path::Path;

use colored::Colorize;
use dm_fs::EntryKind;
use dm_git::EntryState;
use serde_json::json;

use crate::context::{Context, path_or_cwd};
use crate::error::Result;

/// Run the status command
pub fn run_status(ctx: &Context, container: Option<&Path>, recursive: bool, json: bool) -> Result<()> {
    let dm = ctx.open()?;
    let entries = dm.status(container, recursive)?;

    if json {
        let value: Vec<_> = entries
            .iter()
            .map(|e| json!({ "path": e.path, "state": e.state.as_str() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Tree Status".bold());
    println!();
    println!("  {:<12} {}", "Root:".dimmed(), dm.config().dm_root.display());
    println!();
    if entries.is_empty() {
        println!("  {}", "Nothing to save".green());
        return Ok(());
    }
    for entry in entries {
        let state = match entry.state {
            EntryState::Added | EntryState::Untracked => entry.state.as_str().green(),
            EntryState::Deleted | EntryState::Conflicted => entry.state.as_str().red(),
            _ => entry.state.as_str().yellow(),
        };
        println!("  {:<11} {}", state, entry.path.display());
    }
    Ok(())
}

/// Run the classify command
pub fn run_classify(ctx: &Context, path: Option<&Path>) -> Result<()> {
    let dm = ctx.open()?;
    let path = dm.resolve_path(&path_or_cwd(path)?)?;
    let level = dm.classify(&path)?;
    let kind = match dm.classify_entry(&path)? {
        EntryKind::Dataset => "dataset",
        EntryKind::Folder => "folder",
        EntryKind::FileLocal => "file",
        EntryKind::FileRemote => "file (content not present)",
        EntryKind::Other => "other",
    };

    println!("  {:<12} {}", "Path:".dimmed(), path.display());
    println!("  {:<12} {}", "Level:".dimmed(), level.as_str().cyan());
    println!("  {:<12} {}", "Kind:".dimmed(), kind);
    if let Some((container, key)) = dm.locate(&path) {
        println!("  {:<12} {}", "Container:".dimmed(), container.display());
        println!("  {:<12} {}", "Key:".dimmed(), key);
    }
    Ok(())
}
