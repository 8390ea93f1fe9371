//! Abstract Syntax Tree (AST) for classification queries.
//!
//! A query is a conjunction of terms and parenthesized OR groups. Every node
//! renders back to a canonical query string through [`std::fmt::Display`],
//! and re-parsing that string yields an equal tree.

use std::fmt;

/// A single `property:value` condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    /// Lower-cased property name.
    pub property: String,
    /// Value with its original case, quotes and escapes removed.
    pub value: String,
}

impl Term {
    /// Creates a term. The property is lower-cased the way the parser does it.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into().to_lowercase(),
            value: value.into(),
        }
    }
}

/// A parenthesized disjunction: `(a OR b OR ...)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OrGroup {
    /// Members in source order. Groups may nest.
    pub terms: Vec<QueryNode>,
}

impl OrGroup {
    /// Creates a group from its members.
    pub fn new(terms: Vec<QueryNode>) -> Self {
        Self { terms }
    }
}

/// An item of a query or of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryNode {
    /// A leaf condition.
    Term(Term),
    /// A nested OR group.
    Group(OrGroup),
}

impl From<Term> for QueryNode {
    fn from(term: Term) -> Self {
        QueryNode::Term(term)
    }
}

impl From<OrGroup> for QueryNode {
    fn from(group: OrGroup) -> Self {
        QueryNode::Group(group)
    }
}

/// The root of a parsed query: an implicit AND of its items.
///
/// A query without items places no constraints, and by contract matches no
/// event at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Query {
    /// Top-level items in source order.
    pub items: Vec<QueryNode>,
}

impl Query {
    /// Creates a query from its top-level items.
    pub fn new(items: Vec<QueryNode>) -> Self {
        Self { items }
    }

    /// Returns true if the query has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns every term in the query, depth first, in source order.
    pub fn terms(&self) -> Vec<&Term> {
        let mut terms = Vec::new();
        for item in &self.items {
            collect_terms(item, &mut terms);
        }
        terms
    }
}

fn collect_terms<'a>(node: &'a QueryNode, out: &mut Vec<&'a Term>) {
    match node {
        QueryNode::Term(term) => out.push(term),
        QueryNode::Group(group) => {
            for member in &group.terms {
                collect_terms(member, out);
            }
        }
    }
}

/// Returns true if a value has to be quoted to survive a re-parse.
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\'))
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !needs_quotes(&self.value) {
            return write!(f, "{}:{}", self.property, self.value);
        }

        write!(f, "{}:\"", self.property)?;
        for c in self.value.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("\"")
    }
}

impl fmt::Display for OrGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, member) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            write!(f, "{member}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Term(term) => write!(f, "{term}"),
            QueryNode::Group(group) => write!(f, "{group}"),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}
