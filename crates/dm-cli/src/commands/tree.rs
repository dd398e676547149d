//! Tree provisioning commands

use std::path::Path;

use colored::Colorize;

use crate::context::{Context, path_or_cwd};
use crate::error::Result;

/// Run the init-tree command
pub fn run_init_tree(
    ctx: &Context,
    project: Option<&str>,
    campaign: Option<&str>,
    experiment: Option<&str>,
    force: bool,
) -> Result<()> {
    let dm = ctx.open()?;
    let experiment_path = dm.init_tree(project, campaign, experiment, force)?;

    let mut deepest = dm.config().dm_root.clone();
    for name in [project, campaign, experiment].into_iter().flatten() {
        deepest.push(name);
    }
    println!("{} Tree ready at {}", "✓".green(), deepest.display());
    if let Some(path) = experiment_path {
        tracing::debug!(experiment = %path.display(), "Experiment container");
    }
    Ok(())
}

/// Run the create command
pub fn run_create(ctx: &Context, name: &str, at: Option<&Path>) -> Result<()> {
    let dm = ctx.open()?;
    let at = path_or_cwd(at)?;
    let level = dm.classify(&at)?;
    let created = dm.create_child(&at, name)?;
    println!(
        "{} Created {} {}",
        "✓".green(),
        level.child().as_str(),
        created.display().to_string().cyan()
    );
    Ok(())
}
