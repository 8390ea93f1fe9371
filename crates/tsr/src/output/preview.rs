//! Preview output formatting.

use serde::Serialize;
use timesheet_rules::{CalendarEvent, Preview};

use super::helpers::{event_title, format_header, format_start, truncate_id, truncate_str};

/// JSON output structure for the preview command.
#[derive(Serialize)]
pub struct PreviewOutput<'a> {
    pub query: &'a str,
    pub total_matches: usize,
    pub shown: usize,
    pub matches: Vec<MatchedEventOutput<'a>>,
}

/// JSON output structure for a matched event.
#[derive(Serialize)]
pub struct MatchedEventOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<&'a str>,
}

/// Formats a preview as JSON.
pub fn format_preview_json(preview: &Preview<'_, CalendarEvent>) -> Result<String, serde_json::Error> {
    let matches = preview
        .matches
        .iter()
        .map(|event| MatchedEventOutput {
            id: event.id.as_deref(),
            title: event.title.as_deref(),
            start_time: event.start_time.as_deref(),
        })
        .collect();

    let output = PreviewOutput {
        query: &preview.query,
        total_matches: preview.total_matches,
        shown: preview.matches.len(),
        matches,
    };

    serde_json::to_string_pretty(&output)
}

/// Formats a preview as a table.
pub fn format_preview_table(preview: &Preview<'_, CalendarEvent>, use_colors: bool) -> String {
    if preview.total_matches == 0 {
        return "No matching events.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format_header(
        &format!("{:<8} {:<16} {}", "ID", "Start", "Title"),
        use_colors,
    ));

    for event in &preview.matches {
        let line = format!(
            "{:<8} {:<16} {}",
            truncate_id(event.id.as_deref().unwrap_or("")),
            format_start(event.start_time.as_deref()),
            truncate_str(event_title(event), 60)
        );
        output.push_str(&line);
        output.push('\n');
    }

    let hidden = preview.total_matches - preview.matches.len();
    if hidden > 0 {
        output.push_str(&format!(
            "... and {hidden} more ({} matching events)\n",
            preview.total_matches
        ));
    } else {
        let noun = if preview.total_matches == 1 { "event" } else { "events" };
        output.push_str(&format!("{} matching {noun}\n", preview.total_matches));
    }

    output
}
