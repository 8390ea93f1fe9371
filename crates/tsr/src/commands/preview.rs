//! Preview command implementation.
//!
//! Shows which events a query would match before it is saved as a rule.

use std::path::PathBuf;

use timesheet_rules::preview;

use super::events::load_events;
use super::{CommandContext, Result};
use crate::output::{format_preview_json, format_preview_table};

/// Options for the preview command.
pub struct PreviewOptions {
    /// The query to evaluate.
    pub query: String,
    /// Events file, or `-` for stdin.
    pub events: PathBuf,
    /// Maximum events to list.
    pub limit: usize,
}

/// Executes the preview command.
pub fn execute(ctx: &CommandContext, opts: &PreviewOptions) -> Result<()> {
    let events = load_events(&opts.events)?;
    let result = preview(&opts.query, &events, opts.limit)?;

    if ctx.verbose {
        eprintln!(
            "Evaluated {} against {} events",
            result.query,
            events.len()
        );
    }

    if ctx.json_output {
        println!("{}", format_preview_json(&result)?);
    } else if !ctx.quiet {
        print!("{}", format_preview_table(&result, ctx.use_colors));
    }

    Ok(())
}
