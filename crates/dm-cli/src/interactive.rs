//! Interactive prompts for CLI commands
//!
//! Uses dialoguer for terminal-based input and confirmation.

use std::path::Path;

use colored::Colorize;
use dialoguer::{Confirm, Input};

use crate::error::Result;

/// Ask for a value, offering `default` when there is one.
pub fn prompt_value(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_string());
    }
    Ok(input.interact_text()?)
}

/// Confirm a removal that skips availability checks.
pub fn confirm_reckless_removal(path: &Path) -> Result<bool> {
    println!(
        "{} {} will be removed without checking that its content exists elsewhere.",
        "warning:".yellow().bold(),
        path.display()
    );
    Ok(Confirm::new()
        .with_prompt("Continue?")
        .default(false)
        .interact()?)
}
