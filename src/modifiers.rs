// ABOUTME: The dice-pool mechanic bundle attached to the AST's single Dice node.
// ABOUTME: Kept apart from the AST so keep/reroll/explode/success apply to exactly one pool.

use std::collections::HashMap;

use crate::token::CompareOp;

/// Keep-highest or keep-lowest, mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepClause {
    Highest(u32),
    Lowest(u32),
}

impl KeepClause {
    pub fn count(&self) -> u32 {
        match self {
            KeepClause::Highest(n) | KeepClause::Lowest(n) => *n,
        }
    }
}

/// Success-counting threshold: the pool total becomes the count of kept
/// dice satisfying `operator threshold` instead of their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessClause {
    pub operator: CompareOp,
    pub threshold: i64,
}

/// Reroll-while-matching clause, bounded by `limit` rerolls per die.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RerollClause {
    pub operator: CompareOp,
    pub threshold: i64,
    pub limit: u32,
}

/// Explode-while-matching clause, bounded by `limit` explosions per die.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplosionClause {
    pub operator: CompareOp,
    pub threshold: i64,
    pub limit: u32,
}

pub const DEFAULT_EXPLOSION_LIMIT: u32 = 100;
pub const DEFAULT_REROLL_LIMIT: u32 = 100;

/// All optional dice-pool mechanics recognized by the modifier layer,
/// plus the outer comparison clause and any placeholder resolutions used
/// while parsing. Flat record of options, per the spec's data model;
/// internally-exclusive groups (keep highest/lowest) are tagged enums so
/// the invalid combination isn't representable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RollModifiers {
    /// Extra dice added to the pool before keep selection (advantage/disadvantage).
    pub advantage_count: Option<u32>,
    pub keep: Option<KeepClause>,
    pub success: Option<SuccessClause>,
    pub explosion: Option<ExplosionClause>,
    pub reroll: Option<RerollClause>,
    pub critical_success: Option<i64>,
    pub critical_failure: Option<i64>,
    /// Placeholder name -> resolved integer value, recorded for idempotent
    /// re-parsing of `originalText`.
    pub resolved_variables: HashMap<String, i64>,
}

impl RollModifiers {
    pub fn has_any_modifier(&self) -> bool {
        self.advantage_count.is_some()
            || self.keep.is_some()
            || self.success.is_some()
            || self.explosion.is_some()
            || self.reroll.is_some()
            || self.critical_success.is_some()
            || self.critical_failure.is_some()
    }
}
