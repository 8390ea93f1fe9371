//! Rule application output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;
use timesheet_rules::{ApplyReport, CalendarEvent, EventOutcome, RuleMatch, SkippedRule};

use super::helpers::{
    event_title, format_header, format_source, format_start, format_target, truncate_id,
    truncate_str,
};

/// JSON output structure for the apply command.
#[derive(Serialize)]
pub struct ApplyOutput<'a> {
    pub classified: usize,
    pub did_not_attend: usize,
    pub unmatched: usize,
    pub events: Vec<ApplyEventOutput<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_rules: Vec<SkippedRuleOutput<'a>>,
}

/// JSON output structure for one classified event.
#[derive(Serialize)]
pub struct ApplyEventOutput<'a> {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<&'a RuleMatch>,
}

/// JSON output structure for a rule that was not compiled.
#[derive(Serialize)]
pub struct SkippedRuleOutput<'a> {
    pub rule_id: &'a str,
    pub reason: String,
}

fn visible<'a>(report: &'a ApplyReport, matched_only: bool) -> impl Iterator<Item = &'a EventOutcome> {
    report
        .outcomes
        .iter()
        .filter(move |outcome| !matched_only || outcome.matched.is_some())
}

/// Formats an apply report as JSON.
pub fn format_apply_json(
    report: &ApplyReport,
    events: &[CalendarEvent],
    skipped: &[SkippedRule],
    matched_only: bool,
) -> Result<String, serde_json::Error> {
    let event_outputs = visible(report, matched_only)
        .map(|outcome| {
            let event = events.get(outcome.index);
            ApplyEventOutput {
                index: outcome.index,
                id: outcome.event_id.as_deref(),
                title: event.and_then(|e| e.title.as_deref()),
                matched: outcome.matched.as_ref(),
            }
        })
        .collect();

    let skipped_rules = skipped
        .iter()
        .map(|s| SkippedRuleOutput {
            rule_id: &s.rule_id,
            reason: s.reason.to_string(),
        })
        .collect();

    let output = ApplyOutput {
        classified: report.classified,
        did_not_attend: report.did_not_attend,
        unmatched: report.unmatched,
        events: event_outputs,
        skipped_rules,
    };

    serde_json::to_string_pretty(&output)
}

/// Formats an apply report as a table followed by a summary line.
pub fn format_apply_table(
    report: &ApplyReport,
    events: &[CalendarEvent],
    skipped: &[SkippedRule],
    matched_only: bool,
    use_colors: bool,
) -> String {
    let mut output = String::new();

    for rule in skipped {
        let line = format!("skipped rule {}: {}", rule.rule_id, rule.reason);
        if use_colors {
            output.push_str(&format!("{}\n", line.yellow()));
        } else {
            output.push_str(&line);
            output.push('\n');
        }
    }
    if !skipped.is_empty() {
        output.push('\n');
    }

    let rows: Vec<&EventOutcome> = visible(report, matched_only).collect();
    if rows.is_empty() {
        output.push_str("No events to show.\n");
    } else {
        output.push_str(&format_header(
            &format!(
                "{:<8} {:<16} {:<40} {:<5} {}",
                "ID", "Start", "Title", "Via", "Target"
            ),
            use_colors,
        ));

        for outcome in rows {
            let event = events.get(outcome.index);
            let (via, target) = match &outcome.matched {
                Some(matched) => (
                    format_source(matched.source, use_colors),
                    format_target(&matched.target, use_colors),
                ),
                None => (String::new(), "-".to_string()),
            };
            let via_padding = " ".repeat(5usize.saturating_sub(plain_width(&outcome.matched)));

            let line = format!(
                "{:<8} {:<16} {:<40} {}{} {}",
                truncate_id(outcome.event_id.as_deref().unwrap_or("")),
                format_start(event.and_then(|e| e.start_time.as_deref())),
                truncate_str(event.map(event_title).unwrap_or(""), 40),
                via,
                via_padding,
                target
            );
            output.push_str(line.trim_end());
            output.push('\n');
        }
    }

    output.push_str(&format!(
        "\n{} classified, {} did not attend, {} unmatched\n",
        report.classified, report.did_not_attend, report.unmatched
    ));
    output
}

/// Width of the uncolored source label, so colored labels still align.
fn plain_width(matched: &Option<RuleMatch>) -> usize {
    matched
        .as_ref()
        .map(|m| format_source(m.source, false).len())
        .unwrap_or(0)
}
