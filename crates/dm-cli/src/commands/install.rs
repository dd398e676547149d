//! Install command implementation

use std::path::PathBuf;

use colored::Colorize;
use dm_core::InstallRequest;

use super::parse_json_object;
use crate::context::Context;
use crate::error::Result;

/// Arguments of `dm install`.
#[derive(Debug, Clone)]
pub struct InstallArgs {
    pub source: PathBuf,
    pub experiment: String,
    pub category: String,
    pub project: Option<String>,
    pub campaign: Option<String>,
    pub dest: Option<PathBuf>,
    pub rename: Option<String>,
    pub move_source: bool,
    pub overwrite: bool,
    pub meta: Option<String>,
}

impl InstallArgs {
    /// The core request described by these arguments.
    pub fn to_request(&self) -> Result<InstallRequest> {
        let metadata = self.meta.as_deref().map(parse_json_object).transpose()?;
        Ok(InstallRequest {
            project: self.project.clone(),
            campaign: self.campaign.clone(),
            dest_rel: self.dest.clone(),
            rename: self.rename.clone(),
            move_source: self.move_source,
            overwrite: self.overwrite,
            metadata,
            ..InstallRequest::new(&self.source, &self.experiment, &self.category)
        })
    }
}

/// Run the install command
pub fn run_install(ctx: &Context, args: &InstallArgs) -> Result<()> {
    let request = args.to_request()?;
    let dm = ctx.open()?;
    let target = dm.install_into_tree(&request)?;
    let verb = if args.move_source { "Moved" } else { "Copied" };
    println!(
        "{} {} {} to {}",
        "✓".green(),
        verb,
        args.source.display(),
        target.display().to_string().cyan()
    );
    Ok(())
}
