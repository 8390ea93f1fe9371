//! Lexer (tokenizer) for query strings.
//!
//! The lexer owns the read cursor for a single parse. It reads whole
//! `property:value` terms as one token, so the parser only deals with terms,
//! parentheses and the `OR` keyword.

use super::ast::Term;
use super::error::{QueryError, QueryResult};

/// A token in a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    /// A complete `property:value` term.
    Term(Term),

    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,

    /// The `OR` keyword, any case, standing on its own.
    Or,
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: QueryToken,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// Characters that separate items. Only these four count; other Unicode
/// whitespace is part of a value.
pub(crate) fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Lexer for tokenizing query strings.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// Peeks at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_separator) {
            self.next_char();
        }
    }

    /// Returns true if the cursor sits on a standalone `OR`: the two letters,
    /// followed by a separator, `)` or the end of input.
    fn at_or_keyword(&self) -> bool {
        let rest = self.rest().as_bytes();
        rest.len() >= 2
            && rest[..2].eq_ignore_ascii_case(b"or")
            && rest
                .get(2)
                .map_or(true, |&b| is_separator(b as char) || b == b')')
    }

    /// Reads a property name: an ASCII letter followed by letters, digits
    /// or hyphens. Returns `None` without consuming anything if the cursor
    /// is not on a letter.
    fn read_property(&mut self) -> Option<String> {
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' {
                name.push(c.to_ascii_lowercase());
                self.next_char();
            } else {
                break;
            }
        }
        Some(name)
    }

    /// Reads a double-quoted value. A backslash keeps the next character
    /// verbatim and is itself dropped.
    fn read_quoted_value(&mut self) -> QueryResult<String> {
        let start = self.position;
        self.next_char(); // consume opening quote

        let mut value = String::new();
        while let Some(c) = self.next_char() {
            match c {
                '"' => return Ok(value),
                '\\' => match self.next_char() {
                    Some(escaped) => value.push(escaped),
                    None => value.push('\\'),
                },
                _ => value.push(c),
            }
        }

        Err(QueryError::UnclosedQuote { position: start })
    }

    /// Reads a bare value up to a separator or parenthesis.
    fn read_bare_value(&mut self) -> QueryResult<String> {
        let start = self.position;
        while let Some(c) = self.peek() {
            if is_separator(c) || c == '(' || c == ')' {
                break;
            }
            self.next_char();
        }

        if self.position == start {
            return Err(QueryError::ExpectedValue { position: start });
        }
        Ok(self.input[start..self.position].to_string())
    }

    fn read_term(&mut self) -> QueryResult<Term> {
        let start = self.position;
        let Some(property) = self.read_property() else {
            let found = self.peek().unwrap_or(' ');
            return Err(QueryError::ExpectedProperty {
                found,
                position: start,
            });
        };

        if self.peek() != Some(':') {
            return Err(QueryError::expected_colon(property, self.position));
        }
        self.next_char(); // consume ':'

        let value = if self.peek() == Some('"') {
            self.read_quoted_value()?
        } else {
            self.read_bare_value()?
        };

        Ok(Term { property, value })
    }

    /// Returns the next token with its position, or `None` at end of input.
    pub fn next_token(&mut self) -> QueryResult<Option<PositionedToken>> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let position = self.position;

        let token = match c {
            '(' => {
                self.next_char();
                QueryToken::OpenParen
            }
            ')' => {
                self.next_char();
                QueryToken::CloseParen
            }
            _ if self.at_or_keyword() => {
                self.position += 2;
                QueryToken::Or
            }
            _ => QueryToken::Term(self.read_term()?),
        };

        Ok(Some(PositionedToken { token, position }))
    }

    /// Collects all tokens into a vector (without positions).
    #[cfg(test)]
    pub fn tokenize(mut self) -> QueryResult<Vec<QueryToken>> {
        let mut tokens = Vec::new();
        while let Some(positioned) = self.next_token()? {
            tokens.push(positioned.token);
        }
        Ok(tokens)
    }
}
