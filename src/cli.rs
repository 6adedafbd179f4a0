//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};

/// Switch Claude Code between API providers (Anthropic, Z.ai, MiniMax,
/// Moonshot, or any Anthropic-compatible endpoint).
#[derive(Debug, Parser)]
#[command(
    name = "claudeswap",
    version = claudeswap::build_info::VERSION,
    long_version = claudeswap::build_info::LONG_VERSION,
    after_help = claudeswap::build_info::HELP_BUILD_METADATA
)]
pub struct Args {
    /// Path to config file (default: ~/.config/claudeswap/claudeswap.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Disable color output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Log engine activity to stderr (`CLAUDESWAP_LOG` overrides).
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Make a stored profile the active provider.
    Set {
        name: String,
        /// Switch without probing the provider first.
        #[arg(long = "skip-validate")]
        skip_validate: bool,
    },
    /// Show the active profile and the provider fields in the settings file.
    Status,
    /// Create or update a profile interactively.
    Setup {
        /// Profile name; prompted for when omitted.
        name: Option<String>,
    },
    /// List stored profiles; the active one is marked with `*`.
    List,
    /// Delete a stored profile.
    Remove { name: String },
    /// Clear the provider fields and return to the default Anthropic login.
    Reset,
    /// Probe a stored profile's endpoint without changing anything.
    Validate { name: String },
    /// List retained settings snapshots, newest first.
    Backups,
    /// Restore the settings file from the newest snapshot.
    Rollback,
    /// Write the default config file.
    Init {
        /// Overwrite an existing config after backing it up.
        #[arg(long = "force")]
        force: bool,
    },
    /// Pick the active profile from an interactive list (the default).
    Menu,
}
