//! Data Manager CLI
//!
//! The command-line interface for organizing experiment data in a tree of
//! version-controlled containers.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigAction, MetaAction, SiblingsAction};
use commands::{InstallArgs, PublishArgs, SetupArgs};
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Context::new(cli.config.clone(), cli.verbose);
    match cli.command {
        Some(cmd) => execute_command(&ctx, cmd),
        None => {
            println!("{} Data Manager CLI", "dm".green().bold());
            println!();
            println!("Run {} for available commands.", "dm --help".cyan());
            Ok(())
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Setup {
            root,
            name,
            email,
            project,
            campaign,
        } => commands::run_setup(
            ctx,
            SetupArgs {
                root,
                name,
                email,
                project,
                campaign,
            },
        ),
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => commands::run_config_show(ctx, json),
            ConfigAction::SetRemote { url, repo, user } => {
                commands::run_set_remote(ctx, url.as_deref(), repo.as_deref(), user.as_deref())
            }
            ConfigAction::SetDefaults { project, campaign } => {
                commands::run_set_defaults(ctx, project.as_deref(), campaign.as_deref())
            }
        },
        Commands::InitTree {
            project,
            campaign,
            experiment,
            force,
        } => commands::run_init_tree(
            ctx,
            project.as_deref(),
            campaign.as_deref(),
            experiment.as_deref(),
            force,
        ),
        Commands::Create { name, at } => commands::run_create(ctx, &name, at.as_deref()),
        Commands::Install {
            source,
            experiment,
            category,
            project,
            campaign,
            dest,
            rename,
            move_source,
            overwrite,
            meta,
        } => commands::run_install(
            ctx,
            &InstallArgs {
                source,
                experiment,
                category,
                project,
                campaign,
                dest,
                rename,
                move_source,
                overwrite,
                meta,
            },
        ),
        Commands::Meta { action } => match action {
            MetaAction::Get { path, payload } => commands::run_meta_get(ctx, path.as_deref(), payload),
            MetaAction::Set {
                path,
                data,
                name,
                merge,
                no_commit,
            } => commands::run_meta_set(
                ctx,
                path.as_deref(),
                data.as_deref(),
                name.as_deref(),
                merge,
                !no_commit,
            ),
        },
        Commands::Publish {
            container,
            sibling,
            repo,
            protocol,
            credential,
            private,
            existing,
            no_recursive,
            lazy,
        } => commands::run_publish(
            ctx,
            &PublishArgs {
                container,
                sibling,
                repo,
                protocol,
                credential,
                private,
                existing: existing.into(),
                recursive: !no_recursive,
                lazy,
            },
        ),
        Commands::Push {
            container,
            sibling,
            message,
            recursive,
        } => commands::run_push(
            ctx,
            container.as_deref(),
            sibling.as_deref(),
            message.as_deref(),
            recursive,
        ),
        Commands::Pull {
            container,
            sibling,
            recursive,
        } => commands::run_pull(ctx, container.as_deref(), sibling.as_deref(), recursive),
        Commands::Clone {
            dest,
            url,
            user,
            repo,
        } => commands::run_clone(ctx, &dest, url.as_deref(), user.as_deref(), repo.as_deref()),
        Commands::Siblings { action } => match action {
            SiblingsAction::List {
                container,
                recursive,
            } => commands::run_siblings_list(ctx, container.as_deref(), recursive),
            SiblingsAction::Remove {
                name,
                container,
                recursive,
            } => commands::run_siblings_remove(ctx, &name, container.as_deref(), recursive),
        },
        Commands::Get { path, recursive } => commands::run_get(ctx, path.as_deref(), recursive),
        Commands::Drop { path, recursive } => commands::run_drop(ctx, path.as_deref(), recursive),
        Commands::Remove {
            path,
            recursive,
            reckless,
            yes,
        } => commands::run_remove(ctx, &path, recursive, reckless, yes),
        Commands::Save {
            path,
            message,
            recursive,
        } => commands::run_save(ctx, path.as_deref(), message.as_deref(), recursive),
        Commands::Status {
            container,
            recursive,
            json,
        } => commands::run_status(ctx, container.as_deref(), recursive, json),
        Commands::Classify { path } => commands::run_classify(ctx, path.as_deref()),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "dm", &mut std::io::stdout());
            Ok(())
        }
    }
}
