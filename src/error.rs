// ABOUTME: Error types for the dicecraft library.
// ABOUTME: Covers lexing/parsing (position-carrying) and semantic validation (field-tagged) failures.

use thiserror::Error;

/// A lexical or syntactic failure, carrying the zero-indexed byte position
/// in the source text where the problem was detected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated placeholder starting at position {pos}")]
    UnterminatedPlaceholder { pos: usize },

    #[error("empty placeholder name at position {pos}")]
    EmptyPlaceholderName { pos: usize },

    #[error("unresolved placeholder '%{name}%' at position {pos}")]
    UnresolvedPlaceholder { name: String, pos: usize },

    #[error("unexpected token at position {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        pos: usize,
    },

    #[error("multiple dice pools unsupported (second pool at position {pos})")]
    DuplicateDicePool { pos: usize },

    #[error("missing sides after 'd' at position {pos}")]
    MissingSides { pos: usize },

    #[error("expression is empty")]
    EmptyExpression,
}

/// The field a `ValidationError` pertains to, for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Count,
    Sides,
    Keep,
    Reroll,
    Explode,
    Critical,
    Arithmetic,
    Parentheses,
    Function,
    Operator,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Field::Count => "count",
            Field::Sides => "sides",
            Field::Keep => "keep",
            Field::Reroll => "reroll",
            Field::Explode => "explode",
            Field::Critical => "critical",
            Field::Arithmetic => "arithmetic",
            Field::Parentheses => "parentheses",
            Field::Function => "function",
            Field::Operator => "operator",
        };
        write!(f, "{s}")
    }
}

/// A semantic constraint violation, carrying the field it pertains to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("validation error in field '{field}': {message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The top-level error type returned by this crate's public API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, Error>;
