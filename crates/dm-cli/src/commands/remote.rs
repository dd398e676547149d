//! Remote synchronization commands

use std::path::{Path, PathBuf};

use colored::Colorize;
use dm_core::PublishRequest;
use dm_git::{AccessProtocol, ExistingPolicy};

use crate::context::{Context, container_or_default};
use crate::error::{CliError, Result};

/// Arguments of `dm publish`.
#[derive(Debug, Clone)]
pub struct PublishArgs {
    pub container: Option<PathBuf>,
    pub sibling: String,
    pub repo: Option<String>,
    pub protocol: String,
    pub credential: Option<String>,
    pub private: bool,
    pub existing: ExistingPolicy,
    pub recursive: bool,
    pub lazy: bool,
}

impl PublishArgs {
    /// The core request described by these arguments.
    pub fn to_request(&self) -> Result<PublishRequest> {
        let access_protocol: AccessProtocol = self.protocol.parse().map_err(CliError::user)?;
        Ok(PublishRequest {
            sibling: self.sibling.clone(),
            repo_name: self.repo.clone(),
            container: self.container.clone(),
            access_protocol,
            credential: self.credential.clone(),
            private: self.private,
            existing: self.existing,
            recursive: self.recursive,
            message: None,
        })
    }
}

/// Run the publish command
pub fn run_publish(ctx: &Context, args: &PublishArgs) -> Result<()> {
    let request = args.to_request()?;
    let dm = ctx.open()?;
    if args.lazy {
        let published = dm.publish_lazy_to_remote(&request)?;
        println!(
            "{} Published from {}",
            "✓".green(),
            published.display().to_string().cyan()
        );
    } else {
        dm.publish_sibling(&request)?;
        let target = request
            .container
            .clone()
            .unwrap_or_else(|| dm.config().dm_root.clone());
        println!(
            "{} Published {} to '{}'",
            "✓".green(),
            target.display().to_string().cyan(),
            request.sibling
        );
    }
    Ok(())
}

/// Run the push command
pub fn run_push(
    ctx: &Context,
    container: Option<&Path>,
    sibling: Option<&str>,
    message: Option<&str>,
    recursive: bool,
) -> Result<()> {
    let dm = ctx.open()?;
    let container = container_or_default(&dm, container)?;
    dm.push_to_remotes(&container, recursive, message, sibling)?;
    println!("{} Pushed {}", "✓".green(), container.display());
    Ok(())
}

/// Run the pull command
pub fn run_pull(ctx: &Context, container: Option<&Path>, sibling: Option<&str>, recursive: bool) -> Result<()> {
    let dm = ctx.open()?;
    let container = container_or_default(&dm, container)?;
    dm.pull_from_remotes(&container, recursive, sibling)?;
    println!("{} Updated {}", "✓".green(), container.display());
    Ok(())
}

/// Run the clone command
pub fn run_clone(
    ctx: &Context,
    dest: &Path,
    url: Option<&str>,
    user: Option<&str>,
    repo: Option<&str>,
) -> Result<()> {
    let dm = ctx.open()?;
    let cloned = dm.clone_from_remote(dest, url, user, repo)?;
    println!("{} Cloned into {}", "✓".green(), cloned.display().to_string().cyan());
    Ok(())
}

/// Run the siblings list command
pub fn run_siblings_list(ctx: &Context, container: Option<&Path>, recursive: bool) -> Result<()> {
    let dm = ctx.open()?;
    let container = container_or_default(&dm, container)?;
    let siblings = dm.engine().query_siblings(&container, None, recursive)?;

    println!("{}", "Siblings".bold());
    if siblings.is_empty() {
        println!(
            "  {} (use {} to add one)",
            "None".dimmed(),
            "dm publish".cyan()
        );
    }
    for sibling in siblings {
        println!(
            "  {} {:<10} {} {}",
            "+".green(),
            sibling.name.cyan(),
            sibling.url,
            sibling.path.display().to_string().dimmed()
        );
    }
    Ok(())
}

/// Run the siblings remove command
pub fn run_siblings_remove(ctx: &Context, name: &str, container: Option<&Path>, recursive: bool) -> Result<()> {
    let dm = ctx.open()?;
    let container = container_or_default(&dm, container)?;
    dm.remove_siblings(&container, name, recursive)?;
    println!("{} Removed sibling '{}'", "✓".green(), name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(protocol: &str) -> PublishArgs {
        PublishArgs {
            container: None,
            sibling: "gin".to_string(),
            repo: Some("lab".to_string()),
            protocol: protocol.to_string(),
            credential: None,
            private: true,
            existing: ExistingPolicy::Reconfigure,
            recursive: false,
            lazy: false,
        }
    }

    #[test]
    fn request_from_arguments() {
        let request = args("https").to_request().unwrap();
        assert_eq!(request.access_protocol, AccessProtocol::Https);
        assert_eq!(request.existing, ExistingPolicy::Reconfigure);
        assert_eq!(request.repo_name.as_deref(), Some("lab"));
        assert!(request.private);
        assert!(!request.recursive);
    }

    #[test]
    fn unknown_protocol_is_a_user_error() {
        assert!(matches!(args("ftp").to_request(), Err(CliError::User { .. })));
    }
}
