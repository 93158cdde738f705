// ABOUTME: End-to-end scenarios against the public facade, covering the concrete worked examples.

use std::collections::HashMap;

use dicecraft::{analyze, parse, roll, roll_with_rng, CompareOp, KeepClause, RandomSource};

fn no_vars() -> HashMap<String, i64> {
    HashMap::new()
}

struct Fixed {
    values: Vec<i64>,
    index: usize,
}

impl Fixed {
    fn new(values: Vec<i64>) -> Self {
        Self { values, index: 0 }
    }
}

impl RandomSource for Fixed {
    fn generate_uniform(&mut self, _min: i64, _max: i64) -> i64 {
        let v = self.values[self.index % self.values.len()];
        self.index += 1;
        v
    }
}

#[test]
fn plain_3d6_statistics() {
    let expr = parse("3d6", &no_vars()).unwrap();
    assert_eq!(expr.spec.count, 3);
    assert_eq!(expr.spec.sides, 6);
    let stats = analyze(&expr);
    assert_eq!(stats.minimum, 3.0);
    assert_eq!(stats.maximum, 18.0);
    assert_eq!(stats.expected, 10.5);
}

#[test]
fn arithmetic_statistics() {
    let expr = parse("1d20+5", &no_vars()).unwrap();
    let stats = analyze(&expr);
    assert_eq!(stats.minimum, 6.0);
    assert_eq!(stats.maximum, 25.0);
    assert_eq!(stats.expected, 15.5);
}

#[test]
fn keep_highest_statistics_reproduce_the_documented_formula() {
    let expr = parse("4d6 keep 3 highest", &no_vars()).unwrap();
    let stats = analyze(&expr);
    assert_eq!(stats.minimum, 3.0);
    assert_eq!(stats.maximum, 18.0);
    assert_eq!(stats.expected, 12.6);
}

#[test]
fn advantage_statistics() {
    let expr = parse("1d20 advantage", &no_vars()).unwrap();
    let stats = analyze(&expr);
    assert_eq!(stats.minimum, 1.0);
    assert_eq!(stats.maximum, 20.0);
    assert_eq!(stats.expected, 14.0);
}

#[test]
fn success_counting_statistics() {
    let expr = parse("5d6 >=4", &no_vars()).unwrap();
    let stats = analyze(&expr);
    assert_eq!(stats.minimum, 0.0);
    assert_eq!(stats.maximum, 5.0);
    assert_eq!(stats.expected, 2.5);
}

#[test]
fn explosion_statistics() {
    let expr = parse("3d6 explode >=6", &no_vars()).unwrap();
    let stats = analyze(&expr);
    assert_eq!(stats.minimum, 3.0);
    assert_eq!(stats.maximum, 1818.0);
    assert_eq!(stats.expected, 12.6);
}

#[test]
fn rolling_single_die_under_fixed_source() {
    let expr = parse("1d20", &no_vars()).unwrap();
    let mut rng = Fixed::new(vec![15]);
    let result = roll_with_rng(&expr, &mut rng).unwrap();
    assert_eq!(result.dice_values, vec![15]);
    assert_eq!(result.total, 15.0);
}

#[test]
fn rolling_pool_under_fixed_source() {
    let expr = parse("3d6", &no_vars()).unwrap();
    let mut rng = Fixed::new(vec![3, 4, 5]);
    let result = roll_with_rng(&expr, &mut rng).unwrap();
    assert_eq!(result.dice_values, vec![3, 4, 5]);
    assert_eq!(result.total, 12.0);
}

#[test]
fn missing_count_on_standard_d_is_rejected() {
    assert!(parse("d6", &no_vars()).is_err());
}

#[test]
fn out_of_range_dice_specs_are_rejected() {
    assert!(parse("0d6", &no_vars()).is_err());
    assert!(parse("3d1", &no_vars()).is_err());
    assert!(parse("101d6", &no_vars()).is_err());
    assert!(parse("3d101", &no_vars()).is_err());
}

#[test]
fn unbalanced_parens_are_rejected() {
    assert!(parse("(3d6", &no_vars()).is_err());
}

#[test]
fn parsing_is_idempotent_through_resolved_variables() {
    let mut vars = HashMap::new();
    vars.insert("str".to_string(), 3);
    let first = parse("1d20+%str%", &vars).unwrap();

    let reparsed = parse(&first.original_text, &first.modifiers.resolved_variables).unwrap();

    assert_eq!(first.spec, reparsed.spec);
    assert_eq!(first.modifiers, reparsed.modifiers);
    assert_eq!(first.ast, reparsed.ast);
}

#[test]
fn keep_selection_partitions_the_pool() {
    let expr = parse("4d6 keep 3 highest", &no_vars()).unwrap();
    let mut rng = Fixed::new(vec![1, 5, 3, 6]);
    let result = roll_with_rng(&expr, &mut rng).unwrap();
    assert_eq!(result.kept_indices.len() + result.discarded_indices.len(), 4);
    assert!(result.kept_indices.is_disjoint(&result.discarded_indices));
    assert_eq!(result.expression.modifiers.keep, Some(KeepClause::Highest(3)));
}

#[test]
fn roll_stays_within_statistical_bounds() {
    let expr = parse("4d6 keep 3 highest", &no_vars()).unwrap();
    let stats = analyze(&expr);
    let mut rng = Fixed::new(vec![2, 6, 4, 1, 5, 3]);
    for _ in 0..6 {
        let result = roll_with_rng(&expr, &mut rng).unwrap();
        assert!(result.total >= stats.minimum && result.total <= stats.maximum);
    }
}

#[test]
fn outer_comparison_reports_success_or_failure() {
    let expr = parse("1d20 + 5 >= 15", &no_vars()).unwrap();
    assert_eq!(expr.comparison_op, Some(CompareOp::Ge));
    assert_eq!(expr.comparison_threshold, Some(15));

    let mut rng = Fixed::new(vec![12]);
    let success = roll_with_rng(&expr, &mut rng).unwrap();
    assert_eq!(success.is_success, Some(true));

    let mut rng = Fixed::new(vec![3]);
    let failure = roll_with_rng(&expr, &mut rng).unwrap();
    assert_eq!(failure.is_success, Some(false));
}

#[test]
fn default_random_source_rolls_within_bounds() {
    let expr = parse("2d6", &no_vars()).unwrap();
    let result = roll(&expr).unwrap();
    assert!(result.total >= 2.0 && result.total <= 12.0);
}
