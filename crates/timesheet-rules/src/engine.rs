//! Rule engine: applies stored classification rules and project
//! fingerprints to calendar events.
//!
//! Rules are compiled once by [`RuleEngine::new`] and then evaluated against
//! any number of events. Classification is first-match-wins: enabled rules
//! in priority order, then fingerprints in the order given.

use std::borrow::Cow;
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::EventProperties;
use crate::query::{
    OrGroup, Query, QueryError, QueryEvaluator, QueryNode, QueryParser, QueryResult, Term,
};

/// What a matching rule does to an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target_type", rename_all = "snake_case")]
pub enum RuleTarget {
    /// Assign the event's time to a project.
    Project { project_id: String },
    /// Mark the event as not attended.
    DidNotAttend,
}

impl RuleTarget {
    /// Creates a project target.
    pub fn project(project_id: impl Into<String>) -> Self {
        RuleTarget::Project {
            project_id: project_id.into(),
        }
    }
}

impl fmt::Display for RuleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTarget::Project { project_id } => write!(f, "project {project_id}"),
            RuleTarget::DidNotAttend => f.write_str("did not attend"),
        }
    }
}

/// A stored classification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Query text as the user wrote it.
    pub query: String,

    #[serde(flatten)]
    pub target: RuleTarget,

    /// Higher priorities are tried first.
    #[serde(default)]
    pub priority: i32,

    /// Tie-breaker within a priority, ascending.
    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    /// Creates an enabled rule with default priority and order.
    pub fn new(id: impl Into<String>, query: impl Into<String>, target: RuleTarget) -> Self {
        Self {
            id: id.into(),
            name: None,
            query: query.into(),
            target,
            priority: 0,
            display_order: 0,
            enabled: true,
        }
    }
}

/// Attributes that identify a project's events without an explicit rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// Attendee domains, matched with `domain:`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,

    /// Attendee addresses, matched with `email:`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,

    /// Title keywords, matched with `title:`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Fingerprint {
    /// Builds the equivalent query: a single OR group of `domain:`, `email:`
    /// and `title:` terms, in that order.
    ///
    /// Returns `None` when the fingerprint has no non-blank attribute.
    pub fn to_query(&self) -> Option<Query> {
        let sources = [
            ("domain", &self.domains),
            ("email", &self.emails),
            ("title", &self.keywords),
        ];

        let terms: Vec<QueryNode> = sources
            .into_iter()
            .flat_map(|(property, values)| {
                values
                    .iter()
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .map(move |value| QueryNode::Term(Term::new(property, value)))
            })
            .collect();

        if terms.is_empty() {
            return None;
        }
        Some(Query::new(vec![QueryNode::Group(OrGroup::new(terms))]))
    }
}

/// Whether a match came from an explicit rule or a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Rule,
    Fingerprint,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSource::Rule => f.write_str("rule"),
            MatchSource::Fingerprint => f.write_str("fingerprint"),
        }
    }
}

/// The rule that classified an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    pub source: MatchSource,
    /// Rule id, or `fingerprint:<project_id>` for fingerprints.
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    pub target: RuleTarget,
}

/// Why a rule was left out of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The stored query no longer parses.
    InvalidQuery(QueryError),
    /// The stored query has no terms and could never match.
    EmptyQuery,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidQuery(err) => write!(f, "invalid query: {err}"),
            SkipReason::EmptyQuery => f.write_str("empty query"),
        }
    }
}

/// A rule the engine could not compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    pub rule_id: String,
    pub reason: SkipReason,
}

/// Classification outcome for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    /// Position of the event in the input.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<RuleMatch>,
}

/// Result of applying the engine to a batch of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// One outcome per event, in input order.
    pub outcomes: Vec<EventOutcome>,
    /// Events assigned to a project.
    pub classified: usize,
    /// Events marked as not attended.
    pub did_not_attend: usize,
    /// Events no rule matched.
    pub unmatched: usize,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    source: MatchSource,
    rule_id: String,
    rule_name: Option<String>,
    query: Query,
    target: RuleTarget,
}

impl CompiledRule {
    fn to_match(&self) -> RuleMatch {
        RuleMatch {
            source: self.source,
            rule_id: self.rule_id.clone(),
            rule_name: self.rule_name.clone(),
            target: self.target.clone(),
        }
    }
}

/// Compiled rules and fingerprints, ready to classify events.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
    skipped: Vec<SkippedRule>,
}

impl RuleEngine {
    /// Compiles rules and fingerprints.
    ///
    /// Disabled rules are dropped. Enabled rules are ordered by priority
    /// (descending), then display order (ascending); rules with equal keys
    /// keep their input order. Rules whose query fails to parse or is empty
    /// are skipped and reported by [`RuleEngine::skipped`].
    pub fn new(rules: &[Rule], fingerprints: &[Fingerprint]) -> Self {
        let mut ordered: Vec<&Rule> = rules.iter().filter(|rule| rule.enabled).collect();
        ordered.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.display_order.cmp(&b.display_order))
        });

        let mut compiled = Vec::with_capacity(ordered.len() + fingerprints.len());
        let mut skipped = Vec::new();

        for rule in ordered {
            let reason = match QueryParser::parse(&rule.query) {
                Ok(query) if !query.is_empty() => {
                    compiled.push(CompiledRule {
                        source: MatchSource::Rule,
                        rule_id: rule.id.clone(),
                        rule_name: rule.name.clone(),
                        query,
                        target: rule.target.clone(),
                    });
                    continue;
                }
                Ok(_) => SkipReason::EmptyQuery,
                Err(err) => SkipReason::InvalidQuery(err),
            };

            warn!(rule_id = %rule.id, query = %rule.query, "skipping rule: {reason}");
            skipped.push(SkippedRule {
                rule_id: rule.id.clone(),
                reason,
            });
        }

        for fingerprint in fingerprints {
            let Some(query) = fingerprint.to_query() else {
                debug!(project_id = %fingerprint.project_id, "fingerprint has no attributes");
                continue;
            };
            compiled.push(CompiledRule {
                source: MatchSource::Fingerprint,
                rule_id: format!("fingerprint:{}", fingerprint.project_id),
                rule_name: fingerprint.project_name.clone(),
                query,
                target: RuleTarget::project(fingerprint.project_id.clone()),
            });
        }

        debug!(
            compiled = compiled.len(),
            skipped = skipped.len(),
            "rule engine ready"
        );
        Self {
            rules: compiled,
            skipped,
        }
    }

    /// Rules left out because their query could not be used.
    pub fn skipped(&self) -> &[SkippedRule] {
        &self.skipped
    }

    /// Number of compiled rules and fingerprints.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the first rule matching the event, if any.
    pub fn classify<E: EventProperties + ?Sized>(&self, event: &E) -> Option<RuleMatch> {
        self.rules
            .iter()
            .find(|rule| QueryEvaluator::new(&rule.query).matches(event))
            .map(CompiledRule::to_match)
    }

    /// Classifies every event in parallel.
    ///
    /// Outcomes are reported in input order.
    pub fn apply<E: EventProperties + Sync>(&self, events: &[E]) -> ApplyReport {
        let outcomes: Vec<EventOutcome> = events
            .par_iter()
            .enumerate()
            .map(|(index, event)| EventOutcome {
                index,
                event_id: event.event_id().map(Cow::into_owned),
                matched: self.classify(event),
            })
            .collect();

        let mut report = ApplyReport::default();
        for outcome in &outcomes {
            match outcome.matched.as_ref().map(|m| &m.target) {
                Some(RuleTarget::Project { .. }) => report.classified += 1,
                Some(RuleTarget::DidNotAttend) => report.did_not_attend += 1,
                None => report.unmatched += 1,
            }
        }
        report.outcomes = outcomes;

        debug!(
            events = events.len(),
            classified = report.classified,
            did_not_attend = report.did_not_attend,
            "applied rules"
        );
        report
    }
}

/// Events a query would match, for trying a rule before saving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview<'a, E> {
    /// Canonical rendering of the parsed query.
    pub query: String,
    /// Number of matching events, ignoring the limit.
    pub total_matches: usize,
    /// The first matching events, up to the limit, in input order.
    pub matches: Vec<&'a E>,
}

/// Parses `query` and collects the events it matches.
///
/// # Errors
///
/// Returns the parse error if `query` is malformed.
pub fn preview<'a, E: EventProperties>(
    query: &str,
    events: &'a [E],
    limit: usize,
) -> QueryResult<Preview<'a, E>> {
    let parsed = QueryParser::parse(query)?;
    let evaluator = QueryEvaluator::new(&parsed);

    let mut matches = Vec::new();
    let mut total_matches = 0;
    for event in events.iter().filter(|event| evaluator.matches(*event)) {
        total_matches += 1;
        if matches.len() < limit {
            matches.push(event);
        }
    }

    Ok(Preview {
        query: parsed.to_string(),
        total_matches,
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CalendarEvent;

    fn event(title: &str, attendees: &[&str]) -> CalendarEvent {
        CalendarEvent {
            title: Some(title.to_string()),
            attendees: attendees.iter().map(|a| a.to_string()).collect(),
            ..CalendarEvent::default()
        }
    }

    fn rule(id: &str, query: &str, project: &str) -> Rule {
        Rule::new(id, query, RuleTarget::project(project))
    }

    #[test]
    fn test_fingerprint_to_query() {
        let fingerprint = Fingerprint {
            project_id: "p1".to_string(),
            keywords: vec!["Acme Sync".to_string()],
            domains: vec!["acme.com".to_string(), " ".to_string()],
            emails: vec!["ceo@acme.io".to_string()],
            ..Fingerprint::default()
        };
        let query = fingerprint.to_query().unwrap();
        assert_eq!(
            query.to_string(),
            r#"(domain:acme.com OR email:ceo@acme.io OR title:"Acme Sync")"#
        );
    }

    #[test]
    fn test_empty_fingerprint_has_no_query() {
        let fingerprint = Fingerprint {
            project_id: "p1".to_string(),
            keywords: vec!["".to_string()],
            ..Fingerprint::default()
        };
        assert_eq!(fingerprint.to_query(), None);
    }

    #[test]
    fn test_rules_ordered_by_priority_then_display_order() {
        let mut low = rule("low", "title:sync", "p-low");
        low.priority = 1;
        let mut high_second = rule("high-second", "title:sync", "p-high-2");
        high_second.priority = 5;
        high_second.display_order = 2;
        let mut high_first = rule("high-first", "title:sync", "p-high-1");
        high_first.priority = 5;
        high_first.display_order = 1;

        let engine = RuleEngine::new(&[low, high_second, high_first], &[]);
        let matched = engine.classify(&event("Weekly sync", &[])).unwrap();
        assert_eq!(matched.rule_id, "high-first");
        assert_eq!(matched.source, MatchSource::Rule);
    }

    #[test]
    fn test_rules_before_fingerprints() {
        let fingerprint = Fingerprint {
            project_id: "fp-project".to_string(),
            domains: vec!["acme.com".to_string()],
            ..Fingerprint::default()
        };
        let engine = RuleEngine::new(&[rule("r1", "title:standup", "p1")], &[fingerprint]);

        let both = event("Standup", &["a@acme.com"]);
        assert_eq!(engine.classify(&both).unwrap().rule_id, "r1");

        let only_domain = event("Kickoff", &["a@acme.com"]);
        let matched = engine.classify(&only_domain).unwrap();
        assert_eq!(matched.source, MatchSource::Fingerprint);
        assert_eq!(matched.rule_id, "fingerprint:fp-project");
        assert_eq!(matched.target, RuleTarget::project("fp-project"));
    }

    #[test]
    fn test_disabled_rules_are_dropped() {
        let mut disabled = rule("off", "title:sync", "p1");
        disabled.enabled = false;
        let engine = RuleEngine::new(&[disabled], &[]);
        assert!(engine.is_empty());
        assert!(engine.skipped().is_empty());
        assert_eq!(engine.classify(&event("sync", &[])), None);
    }

    #[test]
    fn test_invalid_and_empty_rules_are_skipped() {
        let engine = RuleEngine::new(
            &[
                rule("broken", "title:\"open", "p1"),
                rule("blank", "   ", "p2"),
                rule("ok", "title:sync", "p3"),
            ],
            &[],
        );

        assert_eq!(engine.len(), 1);
        let skipped: Vec<&str> = engine.skipped().iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(skipped, vec!["broken", "blank"]);
        assert!(matches!(
            engine.skipped()[0].reason,
            SkipReason::InvalidQuery(QueryError::UnclosedQuote { .. })
        ));
        assert_eq!(engine.skipped()[1].reason, SkipReason::EmptyQuery);
    }

    #[test]
    fn test_apply_counts_and_order() {
        let engine = RuleEngine::new(
            &[
                Rule::new("dna", "response:declined", RuleTarget::DidNotAttend),
                rule("acme", "domain:acme.com", "acme"),
            ],
            &[],
        );

        let mut declined = event("Acme review", &["x@acme.com"]);
        declined.my_response_status = Some("declined".to_string());
        let events = vec![
            event("Acme sync", &["x@acme.com"]),
            declined,
            event("Lunch", &[]),
        ];

        let report = engine.apply(&events);
        assert_eq!(report.classified, 1);
        assert_eq!(report.did_not_attend, 1);
        assert_eq!(report.unmatched, 1);

        let indices: Vec<usize> = report.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(
            report.outcomes[1].matched.as_ref().map(|m| &m.target),
            Some(&RuleTarget::DidNotAttend)
        );
        assert_eq!(report.outcomes[2].matched, None);
    }

    #[test]
    fn test_preview_limit_and_total() {
        let events = vec![
            event("Acme 1", &[]),
            event("Other", &[]),
            event("Acme 2", &[]),
            event("Acme 3", &[]),
        ];
        let preview = preview("TITLE:acme", &events, 2).unwrap();

        assert_eq!(preview.query, "title:acme");
        assert_eq!(preview.total_matches, 3);
        let titles: Vec<_> = preview.matches.iter().filter_map(|e| e.title.as_deref()).collect();
        assert_eq!(titles, vec!["Acme 1", "Acme 2"]);
    }

    #[test]
    fn test_preview_rejects_invalid_query() {
        let events: Vec<CalendarEvent> = Vec::new();
        assert!(preview("(title:x", &events, 10).is_err());
    }

    #[test]
    fn test_rule_serde_target_type() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "query": "domain:acme.com",
            "target_type": "project",
            "project_id": "acme",
            "priority": 3
        }))
        .unwrap();
        assert_eq!(rule.target, RuleTarget::project("acme"));
        assert_eq!(rule.priority, 3);
        assert!(rule.enabled);

        let dna: Rule = serde_json::from_value(serde_json::json!({
            "id": "r2",
            "query": "response:declined",
            "target_type": "did_not_attend",
            "enabled": false
        }))
        .unwrap();
        assert_eq!(dna.target, RuleTarget::DidNotAttend);
        assert!(!dna.enabled);
    }
}
