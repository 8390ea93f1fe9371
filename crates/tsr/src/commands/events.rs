//! Reading calendar events from files or stdin.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use timesheet_rules::CalendarEvent;
use tracing::debug;

use super::{CommandError, Result};

/// Reads events from `source`, or from stdin when `source` is `-`.
pub fn load_events(source: &Path) -> Result<Vec<CalendarEvent>> {
    let content = if source == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(source).map_err(|e| {
            CommandError::Events(format!("Failed to read {}: {}", source.display(), e))
        })?
    };

    let events = parse_events(&content)?;
    debug!(source = %source.display(), count = events.len(), "loaded events");
    Ok(events)
}

/// Decodes a JSON array of events, or one JSON object per line.
pub fn parse_events(content: &str) -> Result<Vec<CalendarEvent>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| CommandError::Events(format!("Invalid events array: {}", e)));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| {
                CommandError::Events(format!("Invalid event on line {}: {}", index + 1, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_events_array() {
        let events = parse_events(r#"[{"title": "A"}, {"title": "B", "id": 2}]"#).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_parse_events_json_lines() {
        let content = "{\"title\": \"A\"}\n\n{\"title\": \"B\"}\n";
        let events = parse_events(content).unwrap();
        let titles: Vec<_> = events.iter().filter_map(|e| e.title.as_deref()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_parse_events_stored_rows() {
        let content = r#"[
            {"id": 1, "title": "Standup", "is_recurring": 1},
            {"id": 2, "title": "Acme", "is_recurring": null, "start_time": 1736951400}
        ]"#;
        let events = parse_events(content).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].is_recurring, None);
        assert_eq!(events[1].is_recurring, Some(false));
        assert_eq!(events[1].start_time, None);
        assert_eq!(events[1].title.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_parse_events_json_lines_stored_rows() {
        let content = "{\"title\": \"A\", \"is_recurring\": 0}\n{\"title\": \"B\"}\n";
        let events = parse_events(content).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].is_recurring, None);
    }

    #[test]
    fn test_parse_events_empty() {
        assert!(parse_events("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_events_reports_line() {
        let err = parse_events("{\"title\": \"A\"}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_load_events_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.json");
        fs::write(&path, r#"[{"title": "Standup"}]"#).unwrap();

        let events = load_events(&path).unwrap();
        assert_eq!(events[0].title.as_deref(), Some("Standup"));
    }

    #[test]
    fn test_load_events_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_events(&temp_dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CommandError::Events(_)));
    }
}
