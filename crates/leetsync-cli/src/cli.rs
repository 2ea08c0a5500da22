//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use leetsync_core::Overrides;

/// Mirror accepted LeetCode solutions into a git repository
#[derive(Parser, Debug)]
#[command(name = "leetsync")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH", env = "LEETSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sync into a local repository instead of GitHub
    #[arg(long, global = true, value_name = "PATH")]
    pub local: Option<PathBuf>,

    /// Target branch (defaults to the repository's default branch)
    #[arg(long, global = true, value_name = "NAME")]
    pub branch: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Commit accepted submissions that are not in the repository yet
    Sync {
        /// Show what would be committed without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the last-synced marker recovered from the target branch
    Marker,
}

impl Cli {
    /// Values that take precedence over environment and config file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            local_repo: self.local.clone(),
            branch: self.branch.clone(),
        }
    }
}
