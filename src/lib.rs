// ABOUTME: Core library for parsing, analyzing, and rolling TTRPG dice notation.
// ABOUTME: Exposes a small facade (`parse`, `roll`, `roll_with_rng`) over the lexer/parser/validator/stats/roller pipeline.

//! # dicecraft
//!
//! A dice-expression engine for tabletop RPG tooling: parses Roll20-style
//! dice notation, analyzes it statistically without simulation, and rolls
//! it against a pluggable random source.
//!
//! ## Quick Start
//!
//! ```
//! use dicecraft::{parse, roll};
//!
//! let expression = parse("4d6 keep 3 highest", &Default::default()).unwrap();
//! let result = roll(&expression).unwrap();
//! println!("rolled {}", result.total);
//! ```
//!
//! ## Supported Notation
//!
//! - Basic pools: `3d6`, `1d20`, `d%`, `4dF`
//! - Arithmetic: `1d20 + 5`, `(1d6 + 2) * 3`, `floor(1d20 / 2)`
//! - Keep/advantage: `4d6 keep 3 highest`, `1d20 advantage`
//! - Success counting: `5d6 >=4`
//! - Exploding and reroll: `1d6 explode >=6`, `10d6 reroll <=1`
//! - Critical flags on single-die pools: `1d20 crit 20 glitch 1`
//! - Placeholders resolved from caller-supplied variables: `1d20+%str%`

use std::collections::HashMap;

pub mod ast;
pub mod error;
pub mod lexer;
pub mod modifiers;
pub mod parser;
pub mod roller;
pub mod stats;
pub mod token;
pub mod validator;

pub use ast::{AstNode, BinOp, DiceSpecification, DiceType, FuncName};
pub use error::{Error, Field, ParseError, Result, ValidationError};
pub use modifiers::{
    ExplosionClause, KeepClause, RerollClause, RollModifiers, SuccessClause,
};
pub use roller::{ExplosionRecord, RandomSource, RerollRecord, RollResult, SystemRandom};
pub use stats::StatisticalData;
pub use token::CompareOp;

/// The immutable artifact of parsing: the dice pool shape, its mechanics,
/// the arithmetic tree around it, its precomputed statistics, the source
/// text it came from, and any outer success comparison. Freely `Clone`,
/// `Send`, and `Sync`, safe to parse once and roll many times, including
/// concurrently across threads (each roll takes its own random source).
#[derive(Debug, Clone)]
pub struct ParsedExpression {
    pub spec: DiceSpecification,
    pub modifiers: RollModifiers,
    pub ast: AstNode,
    pub statistics: StatisticalData,
    pub original_text: String,
    pub comparison_op: Option<CompareOp>,
    pub comparison_threshold: Option<i64>,
}

/// Parses dice notation into a [`ParsedExpression`], resolving any
/// `%name%` placeholders against `variables`.
///
/// # Examples
///
/// ```
/// use dicecraft::parse;
/// use std::collections::HashMap;
///
/// let mut vars = HashMap::new();
/// vars.insert("str".to_string(), 3);
/// let expr = parse("1d20+%str%", &vars).unwrap();
/// assert_eq!(expr.spec.count, 1);
/// ```
pub fn parse(text: &str, variables: &HashMap<String, i64>) -> Result<ParsedExpression> {
    let out = parser::parse_with_variables(text, variables)?;
    let statistics = stats::analyze(&out.spec, &out.modifiers, &out.ast);
    Ok(ParsedExpression {
        spec: out.spec,
        modifiers: out.modifiers,
        ast: out.ast,
        statistics,
        original_text: text.to_string(),
        comparison_op: out.comparison_op,
        comparison_threshold: out.comparison_threshold,
    })
}

/// Returns a parsed expression's precomputed {min, max, expected}.
///
/// # Examples
///
/// ```
/// use dicecraft::{parse, analyze};
///
/// let expr = parse("3d6", &Default::default()).unwrap();
/// let stats = analyze(&expr);
/// assert_eq!(stats.minimum, 3.0);
/// assert_eq!(stats.maximum, 18.0);
/// ```
pub fn analyze(expr: &ParsedExpression) -> StatisticalData {
    expr.statistics
}

/// Rolls a parsed expression using the default cryptographically secure
/// random source.
///
/// # Examples
///
/// ```
/// use dicecraft::{parse, roll};
///
/// let expr = parse("2d6", &Default::default()).unwrap();
/// let result = roll(&expr).unwrap();
/// assert!(result.total >= 2.0 && result.total <= 12.0);
/// ```
pub fn roll(expr: &ParsedExpression) -> Result<RollResult> {
    roller::roll(expr)
}

/// Rolls a parsed expression using a caller-supplied random source.
///
/// Useful for tests or replays where the sequence of die values must be
/// reproducible.
///
/// # Examples
///
/// ```
/// use dicecraft::{parse, roll_with_rng, RandomSource};
///
/// struct Fixed(i64);
/// impl RandomSource for Fixed {
///     fn generate_uniform(&mut self, _min: i64, _max: i64) -> i64 {
///         self.0
///     }
/// }
///
/// let expr = parse("1d20", &Default::default()).unwrap();
/// let result = roll_with_rng(&expr, &mut Fixed(15)).unwrap();
/// assert_eq!(result.total, 15.0);
/// ```
pub fn roll_with_rng(expr: &ParsedExpression, rng: &mut impl RandomSource) -> Result<RollResult> {
    roller::roll_with_rng(expr, rng)
}
