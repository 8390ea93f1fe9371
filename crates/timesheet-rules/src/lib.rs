//! Classification rules for timesheet calendar events.
//!
//! Users describe which events belong to which project with Gmail-style
//! queries such as `domain:acme.com title:"weekly sync"`. This crate parses
//! those queries, evaluates them against events, and applies whole rule sets.
//!
//! - [`query`] - the query language: parser, AST and evaluator
//! - [`event`] - the event record and the [`EventProperties`] contract
//! - [`engine`] - stored rules, project fingerprints and batch application
//!
//! # Example
//!
//! ```
//! use timesheet_rules::{CalendarEvent, Rule, RuleEngine, RuleTarget};
//!
//! let rules = vec![Rule::new("r1", "domain:acme.com", RuleTarget::project("acme"))];
//! let engine = RuleEngine::new(&rules, &[]);
//!
//! let event = CalendarEvent {
//!     attendees: vec!["pm@acme.com".to_string()],
//!     ..CalendarEvent::default()
//! };
//! let matched = engine.classify(&event).unwrap();
//! assert_eq!(matched.target, RuleTarget::project("acme"));
//! ```

pub mod engine;
pub mod event;
pub mod query;

pub use engine::{
    preview, ApplyReport, EventOutcome, Fingerprint, MatchSource, Preview, Rule, RuleEngine,
    RuleMatch, RuleTarget, SkipReason, SkippedRule,
};
pub use event::{parse_timestamp, CalendarEvent, EventProperties};
pub use query::{Query, QueryError, QueryEvaluator, QueryParser, QueryResult};
