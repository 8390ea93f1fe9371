use clap::Parser;
use std::io;
use std::process::ExitCode;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::Cli;
use commands::CommandError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(default_filter(&cli));

    match dispatch::dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{error_json:#}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(error_status(&e))
        }
    }
}

/// Log level used when `RUST_LOG` is not set.
fn default_filter(cli: &Cli) -> &'static str {
    if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    }
}

/// Installs a compact stderr subscriber filtered by `RUST_LOG`.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Ignore the error: a subscriber may already be installed.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .try_init();
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Query(_) => "QUERY_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Events(_) => "EVENTS_ERROR",
        CommandError::Rules(_) => "RULES_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit status for an error: 2 for invalid queries, 1 otherwise.
fn error_status(e: &CommandError) -> u8 {
    match e {
        CommandError::Query(_) => 2,
        _ => 1,
    }
}
