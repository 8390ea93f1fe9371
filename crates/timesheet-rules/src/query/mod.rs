//! Query parser and evaluator for Gmail-style classification queries.
//!
//! Rules that assign calendar events to billing projects are written in a
//! small query language, parsed once and evaluated against many events.
//!
//! # Supported Syntax
//!
//! ## Terms
//! - `property:value` - a single condition
//! - `property:"quoted value"` - values with spaces; `\` keeps the next
//!   character verbatim
//!
//! ## Combining
//! - `a:1 b:2` - top-level items are AND-ed
//! - `(a:1 OR b:2)` - a parenthesized group is OR-ed; groups may nest
//!
//! ## Properties
//! - `title`, `description` - substring, case-insensitive
//! - `attendees` - substring of any attendee address
//! - `domain`, `email` - exact attendee domain / address
//! - `response`, `transparency`, `visibility`, `color`, `recurrence-id` -
//!   exact state, with `free`/`busy` and `pending` aliases
//! - `recurring`, `is-all-day`, `has-attendees` - `yes`/`no` flags
//! - `day-of-week` - `mon`..`sun` or full names
//! - `time-of-day` - `HH:MM`, optionally prefixed by `<`, `<=`, `>`, `>=`
//!
//! Unknown properties parse but never match.
//!
//! # Example
//!
//! ```
//! use timesheet_rules::query::{QueryEvaluator, QueryParser};
//! use timesheet_rules::CalendarEvent;
//!
//! let query = QueryParser::parse("(domain:acme.com OR domain:acme.io) title:standup").unwrap();
//! assert_eq!(query.to_string(), "(domain:acme.com OR domain:acme.io) title:standup");
//!
//! let event = CalendarEvent {
//!     title: Some("Daily Standup".to_string()),
//!     attendees: vec!["dev@acme.io".to_string()],
//!     ..CalendarEvent::default()
//! };
//! assert!(QueryEvaluator::new(&query).matches(&event));
//! ```

mod ast;
mod error;
mod evaluator;
mod lexer;
mod parser;
mod property;

pub use ast::{OrGroup, Query, QueryNode, Term};
pub use error::{QueryError, QueryResult};
pub use evaluator::{evaluate_query, normalize_for_match, QueryEvaluator};
pub use parser::QueryParser;
pub use property::{suggest_property, Property, PropertyKind};

impl Query {
    /// Returns the terms whose property the evaluator does not know.
    ///
    /// Such terms are legal but can never match, so callers accepting user
    /// input may want to warn about them.
    pub fn unknown_properties(&self) -> Vec<&Term> {
        self.terms()
            .into_iter()
            .filter(|term| Property::from_name(&term.property).is_none())
            .collect()
    }
}
