//! Check command implementation.
//!
//! Parses a query and shows how it was understood.

use timesheet_rules::QueryParser;

use super::{CommandContext, Result};
use crate::output::{format_check_json, format_check_table};

/// Options for the check command.
pub struct CheckOptions {
    /// The query to check.
    pub query: String,
}

/// Executes the check command.
///
/// # Errors
///
/// Returns [`CommandError::Query`](super::CommandError::Query) if the query
/// does not parse.
pub fn execute(ctx: &CommandContext, opts: &CheckOptions) -> Result<()> {
    let query = QueryParser::parse(&opts.query)?;

    if ctx.json_output {
        println!("{}", format_check_json(&query)?);
    } else if !ctx.quiet {
        print!("{}", format_check_table(&query, ctx.use_colors));
    }

    Ok(())
}
