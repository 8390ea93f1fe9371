//! Query check output formatting.

use owo_colors::OwoColorize;
use serde::Serialize;
use timesheet_rules::query::{suggest_property, Property, Query, QueryNode};

/// JSON output structure for the check command.
#[derive(Serialize)]
pub struct CheckOutput<'a> {
    pub valid: bool,
    pub query: String,
    pub terms: Vec<TermOutput<'a>>,
    pub warnings: Vec<WarningOutput<'a>>,
}

/// JSON output structure for a single term.
#[derive(Serialize)]
pub struct TermOutput<'a> {
    pub property: &'a str,
    pub value: &'a str,
    pub known: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

/// JSON output structure for an unknown-property warning.
#[derive(Serialize)]
pub struct WarningOutput<'a> {
    pub property: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
}

fn warnings(query: &Query) -> Vec<WarningOutput<'_>> {
    query
        .unknown_properties()
        .into_iter()
        .map(|term| {
            let suggestion = suggest_property(&term.property);
            let message = match suggestion {
                Some(known) => format!(
                    "unknown property '{}' never matches (did you mean '{}'?)",
                    term.property, known
                ),
                None => format!("unknown property '{}' never matches", term.property),
            };
            WarningOutput {
                property: &term.property,
                message,
                suggestion,
            }
        })
        .collect()
}

/// Formats a checked query as JSON.
pub fn format_check_json(query: &Query) -> Result<String, serde_json::Error> {
    let terms = query
        .terms()
        .into_iter()
        .map(|term| {
            let property = Property::from_name(&term.property);
            TermOutput {
                property: &term.property,
                value: &term.value,
                known: property.is_some(),
                kind: property.map(|p| p.kind().name()),
            }
        })
        .collect();

    let output = CheckOutput {
        valid: true,
        query: query.to_string(),
        terms,
        warnings: warnings(query),
    };

    serde_json::to_string_pretty(&output)
}

/// Formats a checked query as an indented tree with warnings.
pub fn format_check_table(query: &Query, use_colors: bool) -> String {
    let mut output = String::new();

    if query.is_empty() {
        output.push_str("Empty query (matches no events).\n");
        return output;
    }

    let rendered = query.to_string();
    if use_colors {
        output.push_str(&format!("{} {}\n", "✓".green(), rendered.bold()));
    } else {
        output.push_str(&format!("✓ {rendered}\n"));
    }

    output.push_str("\nAll of:\n");
    for item in &query.items {
        write_node(&mut output, item, 1, use_colors);
    }

    let warnings = warnings(query);
    if !warnings.is_empty() {
        output.push('\n');
        for warning in warnings {
            if use_colors {
                output.push_str(&format!("{} {}\n", "warning:".yellow(), warning.message));
            } else {
                output.push_str(&format!("warning: {}\n", warning.message));
            }
        }
    }

    output
}

fn write_node(output: &mut String, node: &QueryNode, depth: usize, use_colors: bool) {
    let indent = "  ".repeat(depth);
    match node {
        QueryNode::Term(term) => {
            let kind = Property::from_name(&term.property).map(Property::kind);
            let property = match kind {
                Some(_) if use_colors => term.property.cyan().to_string(),
                None if use_colors => term.property.red().to_string(),
                _ => term.property.clone(),
            };
            let label = match kind {
                Some(kind) => format!(" ({kind})"),
                None => " (unknown)".to_string(),
            };
            output.push_str(&format!("{indent}{property} = {:?}{label}\n", term.value));
        }
        QueryNode::Group(group) if group.terms.is_empty() => {
            output.push_str(&format!("{indent}any of: (empty, never matches)\n"));
        }
        QueryNode::Group(group) => {
            output.push_str(&format!("{indent}any of:\n"));
            for member in &group.terms {
                write_node(output, member, depth + 1, use_colors);
            }
        }
    }
}
