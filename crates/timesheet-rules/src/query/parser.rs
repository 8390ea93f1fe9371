//! Recursive descent parser for classification queries.

use super::ast::{OrGroup, Query, QueryNode};
use super::error::{QueryError, QueryResult};
use super::lexer::{Lexer, QueryToken};

/// Parser for Gmail-style classification queries.
///
/// # Grammar
///
/// ```text
/// query         ::= term_or_group*
/// term_or_group ::= group | term
/// group         ::= "(" (term_or_group | "OR")* ")"
/// term          ::= property ":" value
/// property      ::= letter (letter | digit | "-")*
/// value         ::= quoted_string | bare_string
/// ```
///
/// Top-level items are implicitly AND-ed. `OR` is only a keyword inside a
/// group; at the top level the word is read as a property name, so
/// `a:1 OR b:2` is rejected rather than silently turned into a conjunction.
/// Groups nest to any depth.
///
/// # Example
///
/// ```
/// use timesheet_rules::query::{QueryParser, QueryNode, Term};
///
/// let query = QueryParser::parse(r#"domain:acme.com title:"weekly sync""#).unwrap();
/// assert_eq!(query.items.len(), 2);
/// assert_eq!(query.items[1], QueryNode::Term(Term::new("title", "weekly sync")));
///
/// // Empty input is a valid query with no constraints.
/// assert!(QueryParser::parse("   ").unwrap().is_empty());
/// ```
pub struct QueryParser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> QueryParser<'a> {
    /// Parses a query string into a [`Query`].
    ///
    /// The input is trimmed first. Empty or whitespace-only input yields a
    /// query with no items.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for a missing `:`, an empty value, an
    /// unclosed quote or parenthesis, a stray `)`, or a term that does not
    /// start with a letter. Unknown property names are accepted.
    pub fn parse(input: &str) -> QueryResult<Query> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Query::default());
        }

        let mut parser = QueryParser {
            lexer: Lexer::new(trimmed),
        };
        parser.parse_query()
    }

    /// Parses top-level items until end of input.
    fn parse_query(&mut self) -> QueryResult<Query> {
        let mut items = Vec::new();

        while let Some(positioned) = self.lexer.next_token()? {
            match positioned.token {
                QueryToken::Term(term) => items.push(QueryNode::Term(term)),
                QueryToken::OpenParen => {
                    items.push(QueryNode::Group(self.parse_group(positioned.position)?))
                }
                QueryToken::CloseParen => {
                    return Err(QueryError::UnexpectedCloseParen {
                        position: positioned.position,
                    })
                }
                QueryToken::Or => {
                    return Err(QueryError::expected_colon("or", positioned.position + 2))
                }
            }
        }

        Ok(Query::new(items))
    }

    /// Parses group members after the opening `(` up to and including the
    /// matching `)`.
    fn parse_group(&mut self, open_position: usize) -> QueryResult<OrGroup> {
        let mut terms = Vec::new();

        loop {
            let Some(positioned) = self.lexer.next_token()? else {
                return Err(QueryError::UnclosedParenthesis {
                    position: open_position,
                });
            };

            match positioned.token {
                QueryToken::CloseParen => return Ok(OrGroup::new(terms)),
                QueryToken::Or => continue,
                QueryToken::OpenParen => {
                    terms.push(QueryNode::Group(self.parse_group(positioned.position)?))
                }
                QueryToken::Term(term) => terms.push(QueryNode::Term(term)),
            }
        }
    }
}
