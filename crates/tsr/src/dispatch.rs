//! Command dispatch module for routing CLI commands to their handlers.

use std::path::Path;

use tracing::debug;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::{self, CommandContext, CommandError, Result};
use commands::config::{load_config, Config};

/// Config subcommands. These run against default settings so that a
/// config file that fails to load can still be located and replaced.
pub enum ConfigDispatch<'a> {
    Path,
    Init { force: bool },
    Show,
    Set { key: &'a str, value: &'a str },
}

impl<'a> ConfigDispatch<'a> {
    /// Maps the parsed subcommand; a bare `tsr config` shows the config.
    pub fn new(command: &'a Option<ConfigCommands>) -> Self {
        match command {
            Some(ConfigCommands::Show) | None => Self::Show,
            Some(ConfigCommands::Path) => Self::Path,
            Some(ConfigCommands::Init { force }) => Self::Init { force: *force },
            Some(ConfigCommands::Set { key, value }) => Self::Set { key, value },
        }
    }

    pub fn execute(&self, ctx: &CommandContext, explicit: Option<&Path>) -> Result<()> {
        match self {
            Self::Path => commands::config::execute_path(ctx, explicit),
            Self::Init { force } => commands::config::execute_init(ctx, explicit, *force),
            Self::Show => commands::config::execute_show(ctx, explicit),
            Self::Set { key, value } => {
                let opts = commands::config::ConfigSetOptions {
                    key: key.to_string(),
                    value: value.to_string(),
                };
                commands::config::execute_set(ctx, explicit, &opts)
            }
        }
    }
}

/// Loads the config and builds the command context from it.
fn load_context(cli: &Cli) -> Result<(Config, CommandContext)> {
    let config = load_config(cli.config.as_deref())?;
    let ctx = CommandContext::from_cli(cli, &config);
    Ok((config, ctx))
}

/// Context for config subcommands: the config's settings when it loads,
/// defaults when it does not.
fn config_command_context(cli: &Cli) -> CommandContext {
    let config = load_config(cli.config.as_deref()).unwrap_or_else(|e| {
        debug!(error = %e, "config did not load, using defaults");
        Config::default()
    });
    CommandContext::from_cli(cli, &config)
}

/// Runs the command selected on the command line.
pub fn dispatch(cli: &Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        if !cli.quiet {
            println!("tsr - timesheet classification rules");
            println!("Use --help for usage information");
        }
        return Ok(());
    };

    match command {
        Commands::Check { query } => {
            let (_, ctx) = load_context(cli)?;
            let opts = commands::check::CheckOptions {
                query: query.clone(),
            };
            commands::check::execute(&ctx, &opts)
        }
        Commands::Preview {
            query,
            events,
            limit,
        } => {
            let (config, ctx) = load_context(cli)?;
            let opts = commands::preview::PreviewOptions {
                query: query.clone(),
                events: events.clone(),
                limit: limit.unwrap_or_else(|| config.preview_limit()),
            };
            commands::preview::execute(&ctx, &opts)
        }
        Commands::Apply {
            events,
            rules,
            matched_only,
        } => {
            let (config, ctx) = load_context(cli)?;
            let opts = commands::apply::ApplyOptions {
                events: events.clone(),
                rules: rules.clone(),
                matched_only: *matched_only,
            };
            commands::apply::execute(&ctx, &opts, &config)
        }
        Commands::Config { command } => {
            let ctx = config_command_context(cli);
            ConfigDispatch::new(command).execute(&ctx, cli.config.as_deref())
        }
        Commands::Completions { shell } => {
            commands::completions::execute(shell).map_err(CommandError::Io)
        }
    }
}
