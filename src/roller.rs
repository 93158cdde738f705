// ABOUTME: The roll engine: executes a parsed expression's dice mechanics and produces a RollResult.
// ABOUTME: Reroll, explode, keep/discard, success counting, then AST evaluation and the outer comparison.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::modifiers::KeepClause;
use crate::ParsedExpression;

/// Source of randomness for rolling dice. The spec requires a
/// cryptographically secure source by default; callers that need
/// determinism (tests, replays) supply their own implementation.
pub trait RandomSource {
    /// Returns a uniformly distributed integer in `[min, max]` inclusive.
    fn generate_uniform(&mut self, min: i64, max: i64) -> i64;
}

/// The default `RandomSource`, backed by `rand`'s thread-local CSPRNG.
pub struct SystemRandom(rand::rngs::ThreadRng);

impl SystemRandom {
    pub fn new() -> Self {
        Self(rand::thread_rng())
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn generate_uniform(&mut self, min: i64, max: i64) -> i64 {
        use rand::Rng;
        self.0.gen_range(min..=max)
    }
}

/// A single die's reroll trail: its successive values, how many rerolls it
/// took, and whether the reroll limit cut the sequence short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerollRecord {
    pub rolls: Vec<i64>,
    pub count: u32,
    pub limit_reached: bool,
}

/// A single die's explosion trail: the values added on top of its base
/// roll, how many explosions fired, the die's running total, and whether
/// the explosion limit cut the sequence short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplosionRecord {
    pub rolls: Vec<i64>,
    pub count: u32,
    pub cumulative_total: i64,
    pub limit_reached: bool,
}

/// The outcome of rolling and evaluating one parsed expression.
#[derive(Debug, Clone)]
pub struct RollResult {
    pub expression: ParsedExpression,
    pub total: f64,
    pub dice_values: Vec<i64>,
    pub kept_indices: BTreeSet<usize>,
    pub discarded_indices: BTreeSet<usize>,
    pub success_count: Option<u32>,
    pub is_critical_success: bool,
    pub is_critical_failure: bool,
    pub is_success: Option<bool>,
    pub reroll_history: Vec<RerollRecord>,
    pub explosion_history: Vec<ExplosionRecord>,
}

/// Rolls a parsed expression using the default cryptographically secure source.
pub fn roll(expr: &ParsedExpression) -> Result<RollResult> {
    roll_with_rng(expr, &mut SystemRandom::new())
}

/// Rolls a parsed expression using a caller-supplied randomness source.
pub fn roll_with_rng(expr: &ParsedExpression, rng: &mut impl RandomSource) -> Result<RollResult> {
    let spec = &expr.spec;
    let modifiers = &expr.modifiers;

    let pool_size = (spec.count + modifiers.advantage_count.unwrap_or(0)) as usize;
    let mut dice_values: Vec<i64> = (0..pool_size)
        .map(|_| rng.generate_uniform(spec.min_face(), spec.max_face()))
        .collect();

    let mut reroll_history = Vec::with_capacity(pool_size);
    for value in dice_values.iter_mut() {
        let mut record = RerollRecord {
            rolls: vec![*value],
            count: 0,
            limit_reached: false,
        };
        if let Some(reroll) = modifiers.reroll {
            while reroll.operator.check(*value, reroll.threshold) {
                if record.count >= reroll.limit {
                    record.limit_reached = true;
                    break;
                }
                *value = rng.generate_uniform(spec.min_face(), spec.max_face());
                record.rolls.push(*value);
                record.count += 1;
            }
        }
        reroll_history.push(record);
    }

    let mut explosion_history = Vec::with_capacity(pool_size);
    for value in dice_values.iter_mut() {
        let mut record = ExplosionRecord {
            rolls: Vec::new(),
            count: 0,
            cumulative_total: *value,
            limit_reached: false,
        };
        if let Some(explosion) = modifiers.explosion {
            let mut current = *value;
            while explosion.operator.check(current, explosion.threshold) {
                if record.count >= explosion.limit {
                    record.limit_reached = true;
                    break;
                }
                let addition = rng.generate_uniform(spec.min_face(), spec.max_face());
                *value += addition;
                record.rolls.push(addition);
                record.count += 1;
                record.cumulative_total = *value;
                current = addition;
            }
        }
        explosion_history.push(record);
    }

    let (kept_indices, discarded_indices) = select_kept(&dice_values, modifiers.keep);

    let success_count = modifiers.success.map(|success| {
        kept_indices
            .iter()
            .filter(|&&i| success.operator.check(dice_values[i], success.threshold))
            .count() as u32
    });

    let pool_total: f64 = if let Some(count) = success_count {
        count as f64
    } else {
        kept_indices.iter().map(|&i| dice_values[i] as f64).sum()
    };

    let total = expr.ast.eval(pool_total).map_err(Error::from)?;

    let pool_is_single_die = pool_size == 1;
    let is_critical_success = pool_is_single_die
        && modifiers
            .critical_success
            .map(|threshold| dice_values[0] >= threshold)
            .unwrap_or(false);
    let is_critical_failure = pool_is_single_die
        && modifiers
            .critical_failure
            .map(|threshold| dice_values[0] <= threshold)
            .unwrap_or(false);

    let is_success = expr
        .comparison_op
        .zip(expr.comparison_threshold)
        .map(|(op, threshold)| op.check(total.round() as i64, threshold));

    Ok(RollResult {
        expression: expr.clone(),
        total,
        dice_values,
        kept_indices,
        discarded_indices,
        success_count,
        is_critical_success,
        is_critical_failure,
        is_success,
        reroll_history,
        explosion_history,
    })
}

/// Stable-sorts die indices by value to select which are kept, with ties
/// broken by original position so results are reproducible for a given
/// sequence of rolled values.
fn select_kept(values: &[i64], keep: Option<KeepClause>) -> (BTreeSet<usize>, BTreeSet<usize>) {
    let all: BTreeSet<usize> = (0..values.len()).collect();

    let Some(keep) = keep else {
        return (all, BTreeSet::new());
    };

    let keep_count = (keep.count() as usize).min(values.len());
    let mut indices: Vec<usize> = (0..values.len()).collect();

    match keep {
        KeepClause::Highest(_) => indices.sort_by_key(|&i| std::cmp::Reverse(values[i])),
        KeepClause::Lowest(_) => indices.sort_by_key(|&i| values[i]),
    }

    let kept: BTreeSet<usize> = indices[..keep_count].iter().copied().collect();
    let discarded: BTreeSet<usize> = indices[keep_count..].iter().copied().collect();
    (kept, discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use std::collections::HashMap;

    fn no_vars() -> HashMap<String, i64> {
        HashMap::new()
    }

    /// A deterministic source for testing: replays a fixed sequence of
    /// values, cycling if exhausted.
    struct TestRng {
        values: Vec<i64>,
        index: usize,
    }

    impl TestRng {
        fn new(values: Vec<i64>) -> Self {
            Self { values, index: 0 }
        }
    }

    impl RandomSource for TestRng {
        fn generate_uniform(&mut self, _min: i64, _max: i64) -> i64 {
            let v = self.values[self.index % self.values.len()];
            self.index += 1;
            v
        }
    }

    #[test]
    fn rolls_single_die_to_exact_value() {
        let expr = parse("1d20", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![15]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.total, 15.0);
        assert_eq!(result.dice_values, vec![15]);
    }

    #[test]
    fn sums_plain_pool() {
        let expr = parse("3d6", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![3, 4, 5]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.total, 12.0);
    }

    #[test]
    fn keeps_highest_three_of_four() {
        let expr = parse("4d6 keep 3 highest", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![1, 5, 3, 6]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.total, 14.0);
        assert_eq!(result.discarded_indices.len(), 1);
        assert!(result.discarded_indices.contains(&0));
    }

    #[test]
    fn advantage_keeps_better_of_two() {
        let expr = parse("1d20 advantage", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![8, 17]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.total, 17.0);
    }

    #[test]
    fn arithmetic_applies_after_pool_total() {
        let expr = parse("2d6+5", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![3, 4]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.total, 12.0);
    }

    #[test]
    fn reroll_replaces_matching_values() {
        let expr = parse("1d6 reroll <=1", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![1, 4]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.total, 4.0);
        assert_eq!(result.reroll_history[0].count, 1);
        assert_eq!(result.reroll_history[0].rolls, vec![1, 4]);
    }

    #[test]
    fn explosion_accumulates_into_same_die() {
        let expr = parse("1d6 explode >=6", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![6, 3]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.dice_values, vec![9]);
        assert_eq!(result.explosion_history[0].count, 1);
        assert_eq!(result.explosion_history[0].cumulative_total, 9);
    }

    #[test]
    fn success_counting_overrides_total() {
        let expr = parse("5d6 >=4", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![4, 1, 5, 2, 6]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.success_count, Some(3));
        assert_eq!(result.total, 3.0);
    }

    #[test]
    fn critical_success_flagged_on_single_die_pool() {
        let expr = parse("1d20 crit 20", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![20]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert!(result.is_critical_success);
        assert!(!result.is_critical_failure);
    }

    #[test]
    fn outer_comparison_reports_success() {
        let expr = parse("1d20 + 5 >= 15", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![12]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.total, 17.0);
        assert_eq!(result.is_success, Some(true));
    }

    #[test]
    fn roll_result_carries_its_parsed_expression() {
        let expr = parse("2d6", &no_vars()).unwrap();
        let mut rng = TestRng::new(vec![3, 4]);
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert_eq!(result.expression.original_text, "2d6");
    }
}
