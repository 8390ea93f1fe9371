//! Apply command implementation.
//!
//! Runs the rule book (explicit rules, then project fingerprints) over a
//! batch of events and reports what each event would be classified as.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use timesheet_rules::{Fingerprint, Rule, RuleEngine};

use super::config::Config;
use super::events::load_events;
use super::{CommandContext, CommandError, Result};
use crate::output::{format_apply_json, format_apply_table};

/// Options for the apply command.
pub struct ApplyOptions {
    /// Events file, or `-` for stdin.
    pub events: PathBuf,
    /// Rules file overriding the rules in the config.
    pub rules: Option<PathBuf>,
    /// Only list events a rule matched.
    pub matched_only: bool,
}

/// Rules and fingerprints, as stored in a rules file or the config.
#[derive(Debug, Default, Deserialize)]
pub struct RuleBook {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub fingerprints: Vec<Fingerprint>,
}

impl RuleBook {
    fn from_config(config: &Config) -> Self {
        Self {
            rules: config.rules.clone(),
            fingerprints: config.fingerprints.clone(),
        }
    }
}

/// Loads a TOML rules file with `[[rules]]` and `[[fingerprints]]` tables.
pub fn load_rule_book(path: &Path) -> Result<RuleBook> {
    let content = fs::read_to_string(path)
        .map_err(|e| CommandError::Rules(format!("Failed to read {}: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| CommandError::Rules(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Executes the apply command.
pub fn execute(ctx: &CommandContext, opts: &ApplyOptions, config: &Config) -> Result<()> {
    let book = match &opts.rules {
        Some(path) => load_rule_book(path)?,
        None => RuleBook::from_config(config),
    };

    if book.rules.is_empty() && book.fingerprints.is_empty() && !ctx.quiet {
        eprintln!("No rules or fingerprints configured; every event will be unmatched.");
    }

    let engine = RuleEngine::new(&book.rules, &book.fingerprints);
    let events = load_events(&opts.events)?;

    if ctx.verbose {
        eprintln!(
            "Applying {} rules ({} skipped) to {} events",
            engine.len(),
            engine.skipped().len(),
            events.len()
        );
    }

    let report = engine.apply(&events);

    if ctx.json_output {
        println!(
            "{}",
            format_apply_json(&report, &events, engine.skipped(), opts.matched_only)?
        );
    } else if !ctx.quiet {
        print!(
            "{}",
            format_apply_table(
                &report,
                &events,
                engine.skipped(),
                opts.matched_only,
                ctx.use_colors
            )
        );
    }

    Ok(())
}
