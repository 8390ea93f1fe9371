//! End-to-end tests for the query language through the public API.

use timesheet_rules::query::{evaluate_query, Term};
use timesheet_rules::{CalendarEvent, QueryError, QueryEvaluator, QueryParser};

fn event_at(start: &str) -> CalendarEvent {
    CalendarEvent {
        start_time: Some(start.to_string()),
        ..CalendarEvent::default()
    }
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_rendered_queries_reparse_to_the_same_tree() {
    let inputs = [
        r#"domain:acme.com title:"weekly sync""#,
        "(domain:a.com OR domain:b.com) recurring:yes",
        "(response:declined OR (transparency:free OR visibility:private))",
        r#"title:"He said \"ship it\"" description:C:\\temp"#,
        "time-of-day:>=09:00 day-of-week:fri",
        "bogus:x",
    ];

    for input in inputs {
        let parsed = QueryParser::parse(input).expect("valid query");
        let rendered = parsed.to_string();
        assert_eq!(
            QueryParser::parse(&rendered).expect("rendered query parses"),
            parsed,
            "{input} rendered as {rendered}"
        );
    }
}

#[test]
fn test_quoted_phrase_is_one_term() {
    let query = QueryParser::parse(r#"title:"weekly sync""#).unwrap();
    assert_eq!(query.terms(), vec![&Term::new("title", "weekly sync")]);
    assert!(QueryEvaluator::new(&query).matches(&CalendarEvent::titled("Weekly Sync Call")));
}

#[test]
fn test_malformed_queries_are_errors() {
    assert!(matches!(
        QueryParser::parse("title"),
        Err(QueryError::ExpectedColon { .. })
    ));
    assert!(matches!(
        QueryParser::parse(r#"title:"unterminated"#),
        Err(QueryError::UnclosedQuote { .. })
    ));
    assert!(matches!(
        QueryParser::parse("(domain:a.com"),
        Err(QueryError::UnclosedParenthesis { .. })
    ));
}

#[test]
fn test_error_messages_name_the_problem() {
    let err = QueryParser::parse("title:a description").unwrap_err();
    assert_eq!(err.to_string(), "expected ':' after property 'description'");
    assert_eq!(err.position(), 19);
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_empty_query_never_matches() {
    let event = CalendarEvent::titled("anything");
    assert!(!evaluate_query("", &event).unwrap());
    assert!(!evaluate_query(" \t ", &event).unwrap());
}

#[test]
fn test_and_requires_every_term() {
    let both = CalendarEvent {
        title: Some("Foo planning".to_string()),
        description: Some("BAR agenda".to_string()),
        ..CalendarEvent::default()
    };
    let title_only = CalendarEvent::titled("Foo planning");

    assert!(evaluate_query("title:foo description:bar", &both).unwrap());
    assert!(!evaluate_query("title:foo description:bar", &title_only).unwrap());
}

#[test]
fn test_or_requires_any_term() {
    let query = "(domain:a.com OR domain:b.com)";
    let with = |email: &str| CalendarEvent {
        attendees: vec![email.to_string()],
        ..CalendarEvent::default()
    };

    assert!(evaluate_query(query, &with("x@a.com")).unwrap());
    assert!(evaluate_query(query, &with("y@B.com")).unwrap());
    assert!(!evaluate_query(query, &with("z@c.com")).unwrap());
}

#[test]
fn test_unknown_property_parses_and_never_matches() {
    let query = QueryParser::parse("bogus:x").unwrap();
    assert_eq!(query.unknown_properties().len(), 1);
    assert!(!QueryEvaluator::new(&query).matches(&CalendarEvent::titled("x")));
}

#[test]
fn test_time_of_day_against_afternoon_event() {
    let event = event_at("2025-03-04T14:30:00Z");
    assert!(evaluate_query("time-of-day:>14:00", &event).unwrap());
    assert!(!evaluate_query("time-of-day:<14:00", &event).unwrap());
    assert!(evaluate_query("time-of-day:14:30", &event).unwrap());
}

#[test]
fn test_domain_extraction() {
    let event = CalendarEvent {
        attendees: vec!["a@acme.com".to_string(), "b@other.org".to_string()],
        ..CalendarEvent::default()
    };
    assert!(evaluate_query("domain:acme.com", &event).unwrap());
    assert!(!evaluate_query("domain:other.com", &event).unwrap());
}

#[test]
fn test_transparency_free_alias() {
    let transparent = CalendarEvent {
        transparency: Some("transparent".to_string()),
        ..CalendarEvent::default()
    };
    let opaque = CalendarEvent {
        transparency: Some("opaque".to_string()),
        ..CalendarEvent::default()
    };
    assert!(evaluate_query("transparency:free", &transparent).unwrap());
    assert!(!evaluate_query("transparency:free", &opaque).unwrap());
}

#[test]
fn test_events_from_stored_rows() {
    let events: Vec<CalendarEvent> = serde_json::from_str(
        r#"[
            {"id": 1, "title": "Sprint Review", "attendees": "[\"qa@acme.com\"]", "is_recurring": true},
            {"id": 2, "title": "Sprint Review", "attendees": null}
        ]"#,
    )
    .unwrap();

    let query = QueryParser::parse("title:sprint recurring:yes has-attendees:yes").unwrap();
    let matched = QueryEvaluator::new(&query).filter_events(&events);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id.as_deref(), Some("1"));
}
