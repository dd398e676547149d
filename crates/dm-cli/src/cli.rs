//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use dm_git::ExistingPolicy;

/// Data Manager - Organize experiment data in a version-controlled tree
#[derive(Parser, Debug)]
#[command(name = "dm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration document to use
    #[arg(long, global = true, env = "ROADMAP_DM_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Configure identity and managed root
    ///
    /// Prompts for anything not given on the command line.
    ///
    /// Examples:
    ///   dm setup --root ~/data --name "Alice" --email alice@lab.org
    ///   dm setup                     # Guided setup
    Setup {
        /// Root directory of the managed tree
        #[arg(long)]
        root: Option<PathBuf>,

        /// Name recorded as author of commits and metadata
        #[arg(long)]
        name: Option<String>,

        /// Email recorded as author of commits and metadata
        #[arg(long)]
        email: Option<String>,

        /// Default project for installs
        #[arg(long)]
        project: Option<String>,

        /// Default campaign for installs
        #[arg(long)]
        campaign: Option<String>,
    },

    /// Show or change the configuration
    Config {
        /// Config action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Create the root and the given tree levels
    ///
    /// Examples:
    ///   dm init-tree roadmap 2025 E1
    ///   dm init-tree roadmap          # Project only
    InitTree {
        project: Option<String>,
        campaign: Option<String>,
        experiment: Option<String>,

        /// Create over existing content and commit once at the end
        #[arg(long)]
        force: bool,
    },

    /// Create one container below the root, a project or a campaign
    Create {
        /// Name of the new container
        name: String,

        /// Parent node (defaults to the current directory)
        #[arg(long)]
        at: Option<PathBuf>,
    },

    /// Copy or move a file or folder into an experiment category
    ///
    /// Examples:
    ///   dm install scan.dat -e E1 -c raw
    ///   dm install ./run3 -e E1 -c analysis --dest fits --move
    Install {
        /// File or folder to install
        source: PathBuf,

        /// Experiment name
        #[arg(short, long)]
        experiment: String,

        /// Category (raw, reduced, measurement, analysis, template,
        /// experimental_optimization, model)
        #[arg(short, long)]
        category: String,

        /// Project (defaults to the configured one)
        #[arg(short, long)]
        project: Option<String>,

        /// Campaign (defaults to the configured one)
        #[arg(long)]
        campaign: Option<String>,

        /// Subdirectory below the category
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Name of the installed item
        #[arg(long)]
        rename: Option<String>,

        /// Move instead of copy
        #[arg(long = "move")]
        move_source: bool,

        /// Replace files and merge folders that exist
        #[arg(long)]
        overwrite: bool,

        /// Metadata as a JSON object
        #[arg(long)]
        meta: Option<String>,
    },

    /// Read or write metadata records
    Meta {
        /// Metadata action to perform
        #[command(subcommand)]
        action: MetaAction,
    },

    /// Publish containers to a remote sibling
    ///
    /// Examples:
    ///   dm publish                   # Whole tree, repository from config
    ///   dm publish --container roadmap/2025 --lazy
    Publish {
        /// Container to publish (defaults to the root)
        #[arg(long)]
        container: Option<PathBuf>,

        /// Sibling name
        #[arg(long, default_value = "gin")]
        sibling: String,

        /// Base repository name (defaults to the configured one)
        #[arg(long)]
        repo: Option<String>,

        /// Access protocol: ssh, https or https-ssh
        #[arg(long, default_value = "ssh")]
        protocol: String,

        /// Stored credential to authenticate with
        #[arg(long)]
        credential: Option<String>,

        /// Create private repositories
        #[arg(long)]
        private: bool,

        /// What to do with a sibling that exists
        #[arg(long, value_enum, default_value_t = ExistingArg::Skip)]
        existing: ExistingArg,

        /// Only publish the container itself
        #[arg(long)]
        no_recursive: bool,

        /// Publish from the nearest ancestor that already has a sibling
        #[arg(long)]
        lazy: bool,
    },

    /// Commit and push to a sibling
    Push {
        /// Container to push (defaults to the current one)
        #[arg(long)]
        container: Option<PathBuf>,

        /// Sibling to push to
        #[arg(long)]
        sibling: Option<String>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Include subdatasets
        #[arg(short, long)]
        recursive: bool,
    },

    /// Merge changes from a sibling
    Pull {
        /// Container to update (defaults to the current one)
        #[arg(long)]
        container: Option<PathBuf>,

        /// Sibling to pull from
        #[arg(long)]
        sibling: Option<String>,

        /// Include subdatasets
        #[arg(short, long)]
        recursive: bool,
    },

    /// Clone a published tree into an empty directory
    Clone {
        /// Destination directory
        dest: PathBuf,

        /// URL root of the remote
        #[arg(long)]
        url: Option<String>,

        /// Remote user
        #[arg(long)]
        user: Option<String>,

        /// Repository name
        #[arg(long)]
        repo: Option<String>,
    },

    /// Manage siblings
    Siblings {
        /// Sibling action to perform
        #[command(subcommand)]
        action: SiblingsAction,
    },

    /// Fetch file content
    Get {
        /// Path inside a container (defaults to the current directory)
        path: Option<PathBuf>,

        /// Include subdatasets
        #[arg(short, long)]
        recursive: bool,
    },

    /// Release local file content
    Drop {
        /// Path inside a container (defaults to the current directory)
        path: Option<PathBuf>,

        /// Include subdatasets
        #[arg(short, long)]
        recursive: bool,
    },

    /// Remove content or containers from the tree
    Remove {
        /// Path to remove
        path: PathBuf,

        /// Remove containers with subdatasets
        #[arg(short, long)]
        recursive: bool,

        /// Skip availability checks
        #[arg(long)]
        reckless: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Commit changes
    Save {
        /// Container or path inside one (defaults to the current directory)
        path: Option<PathBuf>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Include subdatasets
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show uncommitted changes
    Status {
        /// Container (defaults to the root)
        #[arg(long)]
        container: Option<PathBuf>,

        /// Include subdatasets
        #[arg(short, long)]
        recursive: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the tree level and container of a path
    Classify {
        /// Path to classify (defaults to the current directory)
        path: Option<PathBuf>,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   dm completions bash > ~/.local/share/bash-completion/completions/dm
    ///   dm completions zsh > ~/.zfunc/_dm
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Set remote archive settings
    SetRemote {
        /// URL root, e.g. git@gin.g-node.org:/ or a local directory
        #[arg(long)]
        url: Option<String>,

        /// Repository name of the root container
        #[arg(long)]
        repo: Option<String>,

        /// Remote user
        #[arg(long)]
        user: Option<String>,
    },

    /// Set the default project and campaign
    SetDefaults {
        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        campaign: Option<String>,
    },
}

/// Metadata actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MetaAction {
    /// Print a metadata record as JSON
    Get {
        /// Item to read (defaults to the current directory)
        path: Option<PathBuf>,

        /// Print only the payload
        #[arg(long)]
        payload: bool,
    },

    /// Write a metadata record
    Set {
        /// Item to describe (defaults to the current directory)
        path: Option<PathBuf>,

        /// Payload fields as a JSON object
        #[arg(long)]
        data: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Merge into the existing record instead of replacing it
        #[arg(long)]
        merge: bool,

        /// Write without committing
        #[arg(long)]
        no_commit: bool,
    },
}

/// Sibling actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SiblingsAction {
    /// List siblings
    List {
        /// Container (defaults to the current one)
        #[arg(long)]
        container: Option<PathBuf>,

        /// Include subdatasets
        #[arg(short, long)]
        recursive: bool,
    },

    /// Remove a sibling
    Remove {
        /// Sibling name
        name: String,

        /// Container (defaults to the current one)
        #[arg(long)]
        container: Option<PathBuf>,

        /// Include subdatasets
        #[arg(short, long)]
        recursive: bool,
    },
}

/// Handling of a sibling that already exists
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingArg {
    Skip,
    Error,
    Reconfigure,
    Replace,
}

impl From<ExistingArg> for ExistingPolicy {
    fn from(arg: ExistingArg) -> Self {
        match arg {
            ExistingArg::Skip => Self::Skip,
            ExistingArg::Error => Self::Error,
            ExistingArg::Reconfigure => Self::Reconfigure,
            ExistingArg::Replace => Self::Replace,
        }
    }
}
