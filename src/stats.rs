// ABOUTME: Statistical analyzer computing min/max/expected for any accepted expression.
// ABOUTME: Uses closed-form approximations for success counting, explosion, reroll, and keep, then combines through the AST via interval arithmetic.

use crate::ast::{AstNode, BinOp, DiceSpecification, DiceType, FuncName};
use crate::modifiers::RollModifiers;
use crate::token::CompareOp;

/// Minimum, maximum, and expected value of some (sub-)expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalData {
    pub minimum: f64,
    pub maximum: f64,
    pub expected: f64,
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

impl StatisticalData {
    fn literal(n: f64) -> Self {
        Self {
            minimum: n,
            maximum: n,
            expected: n,
        }
    }

    fn combine(op: BinOp, l: Self, r: Self) -> Self {
        let (minimum, maximum, expected) = match op {
            BinOp::Add => (l.minimum + r.minimum, l.maximum + r.maximum, l.expected + r.expected),
            BinOp::Sub => (l.minimum - r.maximum, l.maximum - r.minimum, l.expected - r.expected),
            BinOp::Mul => {
                let corners = [
                    l.minimum * r.minimum,
                    l.minimum * r.maximum,
                    l.maximum * r.minimum,
                    l.maximum * r.maximum,
                ];
                let minimum = corners.iter().cloned().fold(f64::INFINITY, f64::min);
                let maximum = corners.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (minimum, maximum, l.expected * r.expected)
            }
            BinOp::Div => {
                // Division by a range spanning zero is disallowed upstream
                // (no-literal-zero validation); the guard below only
                // protects against a dice-dependent divisor whose range
                // dips through small values.
                let r_min_guard = r.minimum.max(1.0);
                let r_max_guard = r.maximum.max(1.0);
                let expected_guard = r.expected.max(1.0);
                (l.minimum / r_max_guard, l.maximum / r_min_guard, l.expected / expected_guard)
            }
        };
        Self {
            minimum,
            maximum,
            expected: round3(expected),
        }
    }

    fn apply_function(name: FuncName, v: Self) -> Self {
        let apply = |x: f64| match name {
            FuncName::Floor => x.floor(),
            FuncName::Ceil => x.ceil(),
            FuncName::Round => x.round(),
        };
        let expected = match name {
            FuncName::Round => crate::ast::round_half_to_even(v.expected),
            _ => apply(v.expected),
        };
        Self {
            minimum: apply(v.minimum),
            maximum: apply(v.maximum),
            expected: round3(expected),
        }
    }
}

/// Computes {min, max, expected} for a fully parsed expression.
pub fn analyze(spec: &DiceSpecification, modifiers: &RollModifiers, ast: &AstNode) -> StatisticalData {
    let pool = pool_statistics(spec, modifiers);
    ast_statistics(ast, &pool)
}

fn ast_statistics(node: &AstNode, pool: &StatisticalData) -> StatisticalData {
    match node {
        AstNode::Number(n) => StatisticalData::literal(*n),
        AstNode::Dice(_) => *pool,
        AstNode::BinaryOp { op, left, right } => {
            let l = ast_statistics(left, pool);
            let r = ast_statistics(right, pool);
            StatisticalData::combine(*op, l, r)
        }
        AstNode::Function { name, arg } => {
            let v = ast_statistics(arg, pool);
            StatisticalData::apply_function(*name, v)
        }
    }
}

/// The decision tree from the spec: first matching mechanic wins.
fn pool_statistics(spec: &DiceSpecification, modifiers: &RollModifiers) -> StatisticalData {
    if let Some(success) = modifiers.success {
        return success_statistics(spec, modifiers, success.operator, success.threshold);
    }
    if let Some(explosion) = modifiers.explosion {
        return explosion_statistics(spec, explosion.operator, explosion.threshold, explosion.limit);
    }
    if let Some(reroll) = modifiers.reroll {
        return reroll_statistics(spec, reroll.operator, reroll.threshold);
    }
    if let Some(keep) = modifiers.keep {
        return keep_statistics(spec, modifiers, keep);
    }
    default_statistics(spec)
}

fn success_statistics(
    spec: &DiceSpecification,
    modifiers: &RollModifiers,
    operator: CompareOp,
    threshold: i64,
) -> StatisticalData {
    let n = (spec.count + modifiers.advantage_count.unwrap_or(0)) as f64;
    let faces = spec.faces();
    let hits = faces.iter().filter(|&&v| operator.check(v, threshold)).count();
    let p = hits as f64 / faces.len() as f64;
    StatisticalData {
        minimum: 0.0,
        maximum: n,
        expected: round3(n * p),
    }
}

fn explosion_statistics(
    spec: &DiceSpecification,
    operator: CompareOp,
    threshold: i64,
    limit: u32,
) -> StatisticalData {
    let faces = spec.faces();
    let triggers = faces.iter().filter(|&&v| operator.check(v, threshold)).count();
    let p = triggers as f64 / faces.len() as f64;
    let avg_explosions = if p > 0.0 && p < 1.0 {
        (limit as f64).min(p / (1.0 - p))
    } else {
        0.0
    };
    let base_mean = (spec.min_face() + spec.max_face()) as f64 / 2.0;
    let per_die_expected = base_mean * (1.0 + avg_explosions);

    let count = spec.count as f64;
    StatisticalData {
        minimum: count * spec.min_face() as f64,
        maximum: count * spec.max_face() as f64 * (1.0 + limit as f64),
        expected: round3(count * per_die_expected),
    }
}

fn reroll_statistics(spec: &DiceSpecification, operator: CompareOp, threshold: i64) -> StatisticalData {
    let survivors: Vec<i64> = spec
        .faces()
        .into_iter()
        .filter(|&v| !operator.check(v, threshold))
        .collect();
    let (per_die_min, per_die_max, per_die_sum) = survivors.iter().fold(
        (i64::MAX, i64::MIN, 0i64),
        |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
    );
    let per_die_mean = per_die_sum as f64 / survivors.len() as f64;

    let count = spec.count as f64;
    StatisticalData {
        minimum: count * per_die_min as f64,
        maximum: count * per_die_max as f64,
        expected: round3(count * per_die_mean),
    }
}

fn keep_statistics(
    spec: &DiceSpecification,
    modifiers: &RollModifiers,
    keep: crate::modifiers::KeepClause,
) -> StatisticalData {
    let m = (spec.count + modifiers.advantage_count.unwrap_or(0)) as f64;
    let k = keep.count() as f64;
    let sides = spec.sides as f64;

    let expected = match keep {
        crate::modifiers::KeepClause::Highest(n) => (1..=n)
            .map(|i| (sides + 1.0) * (m - i as f64 + 1.0) / (m + 1.0))
            .sum::<f64>(),
        crate::modifiers::KeepClause::Lowest(n) => (1..=n)
            .map(|i| (sides + 1.0) * i as f64 / (m + 1.0))
            .sum::<f64>(),
    };

    StatisticalData {
        minimum: k,
        maximum: k * sides,
        expected: round3(expected),
    }
}

fn default_statistics(spec: &DiceSpecification) -> StatisticalData {
    let count = spec.count as f64;
    let mean = match spec.dice_type {
        DiceType::Fudge => 0.0,
        DiceType::Standard | DiceType::Percentile => (1.0 + spec.sides as f64) / 2.0,
    };
    StatisticalData {
        minimum: count * spec.min_face() as f64,
        maximum: count * spec.max_face() as f64,
        expected: round3(count * mean),
    }
}
