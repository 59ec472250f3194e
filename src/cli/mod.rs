//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Keep a library in sync across devices through one shared snapshot file
#[derive(Parser, Debug)]
#[command(name = "autosync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.autosync/data/library.db)
    #[arg(long, global = true, env = "AUTOSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Sync directory (overrides the saved location)
    #[arg(long, global = true, env = "AUTOSYNC_DIR")]
    pub dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the library database
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Merge the local library into the snapshot
    Export {
        /// Let local records win over snapshot records with the same key
        #[arg(long)]
        prefer_local: bool,
    },

    /// Apply the snapshot to the local library
    Import,

    /// Show snapshot and library status
    Status,

    /// Manage the sync location
    Location {
        #[command(subcommand)]
        command: LocationCommands,
    },

    /// Export on app dismissal, waiting at most --timeout-ms
    OnDismiss {
        /// Give up waiting after this many milliseconds
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Location Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum LocationCommands {
    /// Choose the directory holding the shared snapshot
    Set {
        /// An existing, writable directory
        dir: PathBuf,
    },

    /// Print the saved sync location
    Show,

    /// Forget the saved sync location
    Clear,
}
