//! Query evaluation against calendar events.
//!
//! This module provides the [`QueryEvaluator`] for testing parsed queries
//! against anything implementing [`EventProperties`].
//!
//! Evaluation never fails: unknown properties, missing fields, malformed
//! timestamps and type mismatches all evaluate to "no match".
//!
//! # Example
//!
//! ```
//! use timesheet_rules::query::{QueryEvaluator, QueryParser};
//! use timesheet_rules::CalendarEvent;
//!
//! let query = QueryParser::parse(r#"title:"weekly sync""#).unwrap();
//! let evaluator = QueryEvaluator::new(&query);
//!
//! assert!(evaluator.matches(&CalendarEvent::titled("Weekly Sync Call")));
//! assert!(!evaluator.matches(&CalendarEvent::titled("Retro")));
//! ```

use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

use super::ast::{Query, QueryNode, Term};
use super::error::QueryResult;
use super::parser::QueryParser;
use super::property::Property;
use crate::event::{parse_timestamp, EventProperties};

/// Straight and curly quote characters ignored by every text comparison.
const QUOTE_CHARS: [char; 6] = ['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Lower-cases text and strips quote characters, so copy-pasted "smart"
/// quotes compare equal to plain ones (or to none at all).
pub fn normalize_for_match(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .collect()
}

/// Evaluates a parsed query against events.
///
/// The evaluator only borrows the query, so one parsed query can be shared
/// across threads and evaluated against any number of events.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvaluator<'a> {
    query: &'a Query,
}

impl<'a> QueryEvaluator<'a> {
    /// Creates a new evaluator for the given query.
    pub fn new(query: &'a Query) -> Self {
        Self { query }
    }

    /// Returns true if the event matches the query.
    ///
    /// An empty query matches nothing.
    pub fn matches<E: EventProperties + ?Sized>(&self, event: &E) -> bool {
        if self.query.is_empty() {
            return false;
        }

        let view = EventView::new(event);
        self.query
            .items
            .iter()
            .all(|item| evaluate_node(item, &view))
    }

    /// Filters a slice of events, returning only those that match.
    pub fn filter_events<'b, E: EventProperties>(&self, events: &'b [E]) -> Vec<&'b E> {
        events.iter().filter(|event| self.matches(*event)).collect()
    }
}

/// Parses `query` and evaluates it against a single event.
///
/// # Errors
///
/// Returns the parse error if `query` is malformed.
pub fn evaluate_query<E: EventProperties + ?Sized>(query: &str, event: &E) -> QueryResult<bool> {
    let query = QueryParser::parse(query)?;
    Ok(QueryEvaluator::new(&query).matches(event))
}

/// Per-event view caching the derived values several terms may need.
struct EventView<'e, E: ?Sized> {
    event: &'e E,
    attendees: OnceCell<Cow<'e, [String]>>,
    domains: OnceCell<HashSet<String>>,
    start: OnceCell<Option<NaiveDateTime>>,
    end: OnceCell<Option<NaiveDateTime>>,
}

impl<'e, E: EventProperties + ?Sized> EventView<'e, E> {
    fn new(event: &'e E) -> Self {
        Self {
            event,
            attendees: OnceCell::new(),
            domains: OnceCell::new(),
            start: OnceCell::new(),
            end: OnceCell::new(),
        }
    }

    fn attendees(&self) -> &[String] {
        let event: &'e E = self.event;
        self.attendees.get_or_init(|| event.attendees())
    }

    /// Unique lower-cased domains: the text after the first `@` of each
    /// attendee address.
    fn domains(&self) -> &HashSet<String> {
        self.domains.get_or_init(|| {
            self.attendees()
                .iter()
                .filter_map(|email| email.split('@').nth(1))
                .map(str::to_lowercase)
                .collect()
        })
    }

    fn start(&self) -> Option<NaiveDateTime> {
        *self
            .start
            .get_or_init(|| self.event.start_time().and_then(parse_timestamp))
    }

    fn end(&self) -> Option<NaiveDateTime> {
        *self
            .end
            .get_or_init(|| self.event.end_time().and_then(parse_timestamp))
    }

    /// True when both start and end parse, fall exactly on midnight and are
    /// at least a day apart.
    fn is_all_day(&self) -> Option<bool> {
        let (start, end) = (self.start()?, self.end()?);
        Some(
            start.num_seconds_from_midnight() == 0
                && end.num_seconds_from_midnight() == 0
                && end.signed_duration_since(start) >= Duration::days(1),
        )
    }
}

fn evaluate_node<E: EventProperties + ?Sized>(node: &QueryNode, view: &EventView<'_, E>) -> bool {
    match node {
        QueryNode::Term(term) => evaluate_term(term, view),
        QueryNode::Group(group) => group.terms.iter().any(|member| evaluate_node(member, view)),
    }
}

fn evaluate_term<E: EventProperties + ?Sized>(term: &Term, view: &EventView<'_, E>) -> bool {
    let Some(property) = Property::from_name(&term.property) else {
        return false;
    };
    let value = normalize_for_match(&term.value);
    let event = view.event;

    match property {
        Property::Title => contains(event.title(), &value),
        Property::Description => contains(event.description(), &value),

        Property::Attendees => view
            .attendees()
            .iter()
            .any(|email| normalize_for_match(email).contains(&value)),
        Property::Domain => view.domains().contains(&value),
        Property::Email => view
            .attendees()
            .iter()
            .any(|email| email.to_lowercase() == value),

        Property::Response => {
            let response = lower_or(event.response_status(), "");
            if matches!(
                value.as_str(),
                "needsaction" | "needs-action" | "needs_action" | "pending"
            ) {
                response == "needsaction"
            } else {
                response == value
            }
        }

        Property::Recurring => match_boolean(&value, event.is_recurring()),
        Property::IsAllDay => match_boolean(&value, view.is_all_day()),
        Property::HasAttendees => match_boolean(&value, Some(!view.attendees().is_empty())),

        Property::Transparency => {
            let transparency = lower_or(event.transparency(), "opaque");
            match value.as_str() {
                "free" => transparency == "transparent",
                "busy" => transparency == "opaque",
                _ => transparency == value,
            }
        }
        Property::Visibility => lower_or(event.visibility(), "default") == value,

        Property::DayOfWeek => match (view.start(), weekday_index(&value)) {
            (Some(start), Some(day)) => start.weekday().num_days_from_monday() == day,
            _ => false,
        },
        Property::TimeOfDay => match (view.start(), TimeTarget::parse(&value)) {
            (Some(start), Some(target)) => target.matches(start.hour() * 60 + start.minute()),
            _ => false,
        },

        Property::Color => {
            event
                .color()
                .map(|color| color.to_lowercase())
                .unwrap_or_default()
                == value
        }
        Property::RecurrenceId => lower_or(event.recurrence_id(), "") == value,
    }
}

/// Substring test on normalized text; missing text counts as empty.
fn contains(text: Option<&str>, value: &str) -> bool {
    normalize_for_match(text.unwrap_or("")).contains(value)
}

/// Lower-cases a field, substituting `default` when it is missing or empty.
fn lower_or(field: Option<&str>, default: &str) -> String {
    match field {
        Some(text) if !text.is_empty() => text.to_lowercase(),
        _ => default.to_string(),
    }
}

/// Reads a query flag: `yes`/`true`/`1`/`on` or `no`/`false`/`0`/`off`.
fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "yes" | "true" | "1" | "on" => Some(true),
        "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn match_boolean(value: &str, actual: Option<bool>) -> bool {
    matches!((parse_flag(value), actual), (Some(wanted), Some(actual)) if wanted == actual)
}

/// Maps a day name or three-letter abbreviation to its index (Monday = 0).
fn weekday_index(value: &str) -> Option<u32> {
    let index = match value {
        "mon" | "monday" => 0,
        "tue" | "tuesday" => 1,
        "wed" | "wednesday" => 2,
        "thu" | "thursday" => 3,
        "fri" | "friday" => 4,
        "sat" | "saturday" => 5,
        "sun" | "sunday" => 6,
        _ => return None,
    };
    Some(index)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Less,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    Greater,
}

/// A parsed `time-of-day` value: `[<>]=?H{1,2}:MM`, compared in minutes
/// since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimeTarget {
    comparison: Comparison,
    minutes: u32,
}

impl TimeTarget {
    /// Parses the value prefix; text after the minutes is ignored and hours
    /// are not range checked.
    fn parse(value: &str) -> Option<Self> {
        let (comparison, rest) = if let Some(rest) = value.strip_prefix(">=") {
            (Comparison::GreaterOrEqual, rest)
        } else if let Some(rest) = value.strip_prefix('>') {
            (Comparison::Greater, rest)
        } else if let Some(rest) = value.strip_prefix("<=") {
            (Comparison::LessOrEqual, rest)
        } else if let Some(rest) = value.strip_prefix('<') {
            (Comparison::Less, rest)
        } else {
            (Comparison::Equal, value)
        };

        let hour_digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if !(1..=2).contains(&hour_digits) {
            return None;
        }
        let (hours, rest) = rest.split_at(hour_digits);
        let rest = rest.strip_prefix(':')?;

        let minutes = rest.get(..2)?;
        if !minutes.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let hours: u32 = hours.parse().ok()?;
        let minutes: u32 = minutes.parse().ok()?;
        Some(Self {
            comparison,
            minutes: hours * 60 + minutes,
        })
    }

    fn matches(self, event_minutes: u32) -> bool {
        match self.comparison {
            Comparison::Less => event_minutes < self.minutes,
            Comparison::LessOrEqual => event_minutes <= self.minutes,
            Comparison::Equal => event_minutes == self.minutes,
            Comparison::GreaterOrEqual => event_minutes >= self.minutes,
            Comparison::Greater => event_minutes > self.minutes,
        }
    }
}
