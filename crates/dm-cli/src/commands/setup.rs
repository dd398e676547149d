//! Setup command implementation

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::LazyLock;

use colored::Colorize;
use dm_core::ConfigOverrides;
use regex::Regex;

use crate::context::Context;
use crate::error::{CliError, Result};
use crate::interactive::prompt_value;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").ok());

/// Arguments of `dm setup`.
#[derive(Debug, Clone, Default)]
pub struct SetupArgs {
    pub root: Option<PathBuf>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub project: Option<String>,
    pub campaign: Option<String>,
}

/// Check that `email` looks like an address.
pub fn validate_email(email: &str) -> Result<()> {
    match EMAIL.as_ref() {
        Some(re) if re.is_match(email) => Ok(()),
        _ => Err(CliError::user(format!("'{}' is not an email address", email))),
    }
}

/// Run the setup command
///
/// Values not given fall back to the persisted document; a missing identity
/// is prompted for on a terminal.
pub fn run_setup(ctx: &Context, args: SetupArgs) -> Result<()> {
    let persisted = ctx.location().load()?;
    let interactive = std::io::stdin().is_terminal();

    let name = resolve_value(args.name, persisted.user_name.as_deref(), "Your name", interactive)?;
    let email = resolve_value(args.email, persisted.user_email.as_deref(), "Your email", interactive)?;
    validate_email(&email)?;

    let overrides = ConfigOverrides {
        dm_root: args.root,
        user_name: Some(name),
        user_email: Some(email),
        default_project: args.project,
        default_campaign: args.campaign,
        ..Default::default()
    };
    let dm = ctx.open_with(&overrides)?;
    dm.init_tree(None, None, None, false)?;

    let config = dm.config();
    println!("{} Data manager configured", "✓".green());
    println!();
    println!("  {:<12} {}", "Root:".dimmed(), config.dm_root.display());
    println!(
        "  {:<12} {} <{}>",
        "Identity:".dimmed(),
        config.identity.name,
        config.identity.email
    );
    println!("  {:<12} {}", "Config:".dimmed(), ctx.location().path()?.display());
    Ok(())
}

fn resolve_value(given: Option<String>, stored: Option<&str>, prompt: &str, interactive: bool) -> Result<String> {
    if let Some(value) = given.or_else(|| stored.map(str::to_string)) {
        return Ok(value);
    }
    if interactive {
        return prompt_value(prompt, None);
    }
    Err(CliError::user(format!(
        "{} is not configured, pass it to {}",
        prompt,
        "dm setup".cyan()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(validate_email("alice@lab.org").is_ok());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("a b@lab.org").is_err());
    }

    #[test]
    fn given_value_wins_over_stored() {
        let value = resolve_value(Some("Bob".into()), Some("Alice"), "Your name", false).unwrap();
        assert_eq!(value, "Bob");
        let value = resolve_value(None, Some("Alice"), "Your name", false).unwrap();
        assert_eq!(value, "Alice");
        assert!(resolve_value(None, None, "Your name", false).is_err());
    }
}
