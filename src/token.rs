// ABOUTME: Token types produced by the lexer.
// ABOUTME: Each token carries the byte position it started at, for diagnostics.

use std::fmt;

/// The closed vocabulary of modifier/clause keywords (case-insensitive on input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Advantage,
    Disadvantage,
    Keep,
    Highest,
    Lowest,
    Success,
    Threshold,
    Reroll,
    Explode,
    Crit,
    Critical,
    Glitch,
    Failure,
    /// Any alphabetic run not in the closed vocabulary; rejection is
    /// deferred to the parser so the lexer stays total.
    Unknown(String),
}

impl Keyword {
    fn from_lower(s: &str) -> Self {
        match s {
            "advantage" => Keyword::Advantage,
            "disadvantage" => Keyword::Disadvantage,
            "keep" => Keyword::Keep,
            "highest" => Keyword::Highest,
            "lowest" => Keyword::Lowest,
            "success" => Keyword::Success,
            "threshold" => Keyword::Threshold,
            "reroll" => Keyword::Reroll,
            "explode" => Keyword::Explode,
            "crit" => Keyword::Crit,
            "critical" => Keyword::Critical,
            "glitch" => Keyword::Glitch,
            "failure" => Keyword::Failure,
            other => Keyword::Unknown(other.to_string()),
        }
    }
}

/// The dice marker identifiers recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceMarker {
    /// `d`, sides given separately.
    D,
    /// `dF`, fudge dice (sides implicit = 3, values {-1,0,1}).
    DFudge,
    /// `d%`, percentile dice (sides implicit = 100).
    DPercent,
}

/// The built-in function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncName {
    Floor,
    Ceil,
    Round,
}

/// Comparison operators, used both for success/reroll/explode clauses and
/// for the trailing "success roll" comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
        };
        write!(f, "{s}")
    }
}

impl CompareOp {
    pub fn check(&self, value: i64, threshold: i64) -> bool {
        match self {
            CompareOp::Ge => value >= threshold,
            CompareOp::Gt => value > threshold,
            CompareOp::Le => value <= threshold,
            CompareOp::Lt => value < threshold,
            CompareOp::Eq => value == threshold,
        }
    }
}

/// A single arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
        };
        write!(f, "{s}")
    }
}

/// A lexical token, tagged with the source position it started at.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(i64),
    DiceMarker(DiceMarker),
    Placeholder(String),
    Keyword(Keyword),
    Function(FuncName),
    Operator(Operator),
    Comparison(CompareOp),
    LParen,
    RParen,
    Comma,
    Eof,
}

/// A token paired with its starting byte position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    pub token: Token,
    pub pos: usize,
}

pub(crate) fn classify_identifier(lower: &str) -> Token {
    match lower {
        "d" => Token::DiceMarker(DiceMarker::D),
        "df" => Token::DiceMarker(DiceMarker::DFudge),
        "floor" => Token::Function(FuncName::Floor),
        "ceil" | "ceiling" => Token::Function(FuncName::Ceil),
        "round" => Token::Function(FuncName::Round),
        other => Token::Keyword(Keyword::from_lower(other)),
    }
}
