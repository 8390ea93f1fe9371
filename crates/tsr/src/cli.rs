//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the tsr CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// tsr - classification rules for timesheet calendar events
#[derive(Parser, Debug)]
#[command(name = "tsr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (default: ~/.config/tsr/config.toml)
    #[arg(long, global = true, env = "TSR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a query and show how it was understood
    #[command(alias = "c")]
    Check {
        /// Query, e.g. 'domain:acme.com title:"weekly sync"'
        query: String,
    },

    /// Show the events a query matches
    #[command(alias = "p")]
    Preview {
        /// Query to evaluate
        query: String,

        /// Events file (JSON array or JSON lines, '-' for stdin)
        #[arg(short, long)]
        events: PathBuf,

        /// Maximum events to list (default: from config, else 50)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Classify events with the configured rules and fingerprints
    Apply {
        /// Events file (JSON array or JSON lines, '-' for stdin)
        #[arg(short, long)]
        events: PathBuf,

        /// Rules file (TOML with [[rules]] and [[fingerprints]]; default: config)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Only list events a rule matched
        #[arg(long)]
        matched_only: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (output.color, preview.limit)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}
