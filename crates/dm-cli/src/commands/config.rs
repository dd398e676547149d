//! Config command implementation

use colored::Colorize;
use dm_git::is_valid_repo_name;
use serde_json::json;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the config show command
pub fn run_config_show(ctx: &Context, json: bool) -> Result<()> {
    let dm = ctx.open()?;
    let config = dm.config();

    if json {
        let value = json!({
            "config_path": ctx.location().path()?,
            "dm_root": config.dm_root,
            "user_name": config.identity.name,
            "user_email": config.identity.email,
            "default_project": config.default_project,
            "default_campaign": config.default_campaign,
            "profile": config.profile,
            "GIN_url": config.remote.url_or_default(),
            "GIN_repo": config.remote.repo,
            "GIN_user": config.remote.user,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let unset = || "(unset)".dimmed().to_string();
    println!("{}", "Configuration".bold());
    println!();
    println!("  {:<12} {}", "Document:".dimmed(), ctx.location().path()?.display());
    println!("  {:<12} {}", "Root:".dimmed(), config.dm_root.display());
    println!(
        "  {:<12} {} <{}>",
        "Identity:".dimmed(),
        config.identity.name,
        config.identity.email
    );
    println!(
        "  {:<12} {}",
        "Project:".dimmed(),
        config.default_project.clone().unwrap_or_else(unset)
    );
    println!(
        "  {:<12} {}",
        "Campaign:".dimmed(),
        config.default_campaign.clone().unwrap_or_else(unset)
    );
    println!();
    println!("{}", "Remote".bold());
    println!("  {:<12} {}", "URL:".dimmed(), config.remote.url_or_default());
    println!(
        "  {:<12} {}",
        "Repository:".dimmed(),
        config.remote.repo.clone().unwrap_or_else(unset)
    );
    println!(
        "  {:<12} {}",
        "User:".dimmed(),
        config.remote.user.clone().unwrap_or_else(unset)
    );
    Ok(())
}

/// Run the config set-remote command
pub fn run_set_remote(ctx: &Context, url: Option<&str>, repo: Option<&str>, user: Option<&str>) -> Result<()> {
    for (label, value) in [("repository", repo), ("user", user)] {
        if let Some(value) = value
            && !is_valid_repo_name(value)
        {
            return Err(CliError::user(format!(
                "Invalid {} name '{}': use letters, digits, '.', '_' or '-'",
                label, value
            )));
        }
    }
    if url.is_none() && repo.is_none() && user.is_none() {
        return Err(CliError::user("Nothing to set, pass --url, --repo or --user"));
    }

    let mut dm = ctx.open()?;
    let path = dm.set_remote(url, repo, user)?;
    println!("{} Remote settings saved to {}", "✓".green(), path.display());
    Ok(())
}

/// Run the config set-defaults command
pub fn run_set_defaults(ctx: &Context, project: Option<&str>, campaign: Option<&str>) -> Result<()> {
    for name in [project, campaign].into_iter().flatten() {
        dm_core::validate_level_name(name)?;
    }
    let mut dm = ctx.open()?;
    let path = dm.set_defaults(project, campaign)?;
    println!("{} Defaults saved to {}", "✓".green(), path.display());
    Ok(())
}
