//! Command implementations for the tsr CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod apply;
pub mod check;
pub mod completions;
pub mod config;
pub mod events;
pub mod preview;

use std::env;

use timesheet_rules::QueryError;

use crate::cli::Cli;
use config::Config;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Query parsing error.
    #[error("invalid query: {0}")]
    Query(#[from] QueryError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Events could not be read or decoded.
    #[error("events error: {0}")]
    Events(String),

    /// Rules file could not be read or decoded.
    #[error("rules error: {0}")]
    Rules(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    ///
    /// Colors are on unless disabled by `--no-color`, the `NO_COLOR`
    /// environment variable, or `output.color = false` in the config.
    pub fn from_cli(cli: &Cli, config: &Config) -> Self {
        let no_color_env = env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && !no_color_env && config.output.color != Some(false),
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}
