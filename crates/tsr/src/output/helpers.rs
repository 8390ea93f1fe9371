//! Common helper functions for output formatting.

use owo_colors::OwoColorize;
use timesheet_rules::{parse_timestamp, CalendarEvent, MatchSource, RuleTarget};

/// Truncates an ID to 8 characters for display.
pub fn truncate_id(id: &str) -> String {
    truncate_chars(id, 8, "")
}

/// Truncates a string to a maximum number of characters, ending in `...`.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    truncate_chars(s, max_len, "...")
}

fn truncate_chars(s: &str, max_len: usize, marker: &str) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(marker.chars().count());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(marker);
    out
}

/// Formats an event start time as `Wed Jan 15 14:30`.
///
/// Unparseable timestamps are shown as given; missing ones as an empty
/// string.
pub fn format_start(start_time: Option<&str>) -> String {
    let Some(raw) = start_time else {
        return String::new();
    };
    match parse_timestamp(raw) {
        Some(start) => start.format("%a %b %d %H:%M").to_string(),
        None => raw.to_string(),
    }
}

/// The event's title, or a placeholder.
pub fn event_title(event: &CalendarEvent) -> &str {
    match event.title.as_deref() {
        Some(title) if !title.is_empty() => title,
        _ => "(no title)",
    }
}

/// Formats a rule target for display.
pub fn format_target(target: &RuleTarget, use_colors: bool) -> String {
    match target {
        RuleTarget::Project { project_id } => {
            if use_colors {
                project_id.green().to_string()
            } else {
                project_id.clone()
            }
        }
        RuleTarget::DidNotAttend => {
            let label = "did not attend";
            if use_colors {
                label.yellow().to_string()
            } else {
                label.to_string()
            }
        }
    }
}

/// Short marker for where a match came from.
pub fn format_source(source: MatchSource, use_colors: bool) -> String {
    let label = match source {
        MatchSource::Rule => "rule",
        MatchSource::Fingerprint => "fp",
    };
    if use_colors {
        label.dimmed().to_string()
    } else {
        label.to_string()
    }
}

/// Formats a table header line.
pub fn format_header(header: &str, use_colors: bool) -> String {
    if use_colors {
        format!("{}\n", header.dimmed())
    } else {
        format!("{header}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_id() {
        assert_eq!(truncate_id("abc"), "abc");
        assert_eq!(truncate_id("abcdefghijkl"), "abcdefgh");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_str("this is a long title", 10), "this is...");
    }

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("café crème brûlée", 8), "café ...");
        assert_eq!(truncate_str("日本語のタイトル", 5), "日本...");
    }

    #[test]
    fn test_format_start() {
        assert_eq!(format_start(Some("2025-01-15T14:30:00Z")), "Wed Jan 15 14:30");
        assert_eq!(format_start(Some("garbage")), "garbage");
        assert_eq!(format_start(None), "");
    }

    #[test]
    fn test_event_title_placeholder() {
        assert_eq!(event_title(&CalendarEvent::titled("Standup")), "Standup");
        assert_eq!(event_title(&CalendarEvent::default()), "(no title)");
        assert_eq!(event_title(&CalendarEvent::titled("")), "(no title)");
    }

    #[test]
    fn test_format_target_plain() {
        assert_eq!(format_target(&RuleTarget::project("acme"), false), "acme");
        assert_eq!(format_target(&RuleTarget::DidNotAttend, false), "did not attend");
    }

    #[test]
    fn test_format_source_plain() {
        assert_eq!(format_source(MatchSource::Rule, false), "rule");
        assert_eq!(format_source(MatchSource::Fingerprint, false), "fp");
    }
}
