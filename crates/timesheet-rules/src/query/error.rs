//! Error types for the query parser.

use thiserror::Error;

/// A specialized Result type for query parsing operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while parsing a query string.
///
/// Positions are byte offsets into the trimmed query string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// A term was expected but no property name could be read.
    #[error("expected property name at position {position}, found '{found}'")]
    ExpectedProperty {
        /// The character that could not start a property name.
        found: char,
        /// Byte offset of that character.
        position: usize,
    },

    /// A property name was not followed by `:`.
    #[error("expected ':' after property '{property}'")]
    ExpectedColon {
        /// The (lower-cased) property name.
        property: String,
        /// Byte offset where the colon was expected.
        position: usize,
    },

    /// A `:` was followed by whitespace, a parenthesis or the end of input.
    #[error("expected value at position {position}")]
    ExpectedValue {
        /// Byte offset where the value was expected.
        position: usize,
    },

    /// A quoted value was never closed.
    #[error("unclosed quoted string starting at position {position}")]
    UnclosedQuote {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A group was still open at the end of input.
    #[error("unclosed parenthesis opened at position {position}")]
    UnclosedParenthesis {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },

    /// A `)` appeared with no open group.
    #[error("unexpected ')' at position {position}")]
    UnexpectedCloseParen {
        /// Byte offset of the parenthesis.
        position: usize,
    },
}

impl QueryError {
    /// Creates a missing-colon error.
    pub fn expected_colon(property: impl Into<String>, position: usize) -> Self {
        QueryError::ExpectedColon {
            property: property.into(),
            position,
        }
    }

    /// Returns the byte offset the error points at.
    pub fn position(&self) -> usize {
        match self {
            QueryError::ExpectedProperty { position, .. }
            | QueryError::ExpectedColon { position, .. }
            | QueryError::ExpectedValue { position }
            | QueryError::UnclosedQuote { position }
            | QueryError::UnclosedParenthesis { position }
            | QueryError::UnexpectedCloseParen { position } => *position,
        }
    }
}
