// ABOUTME: Property tests over the universal roll invariants.
// ABOUTME: Generates dice expressions and rolls them against the real random source.

use std::collections::HashMap;

use dicecraft::{analyze, parse, roll};
use proptest::prelude::*;

fn no_vars() -> HashMap<String, i64> {
    HashMap::new()
}

/// Builds a plain `NdM` expression string from generated count/sides.
fn plain_pool(count: u32, sides: u32) -> String {
    format!("{count}d{sides}")
}

/// Builds a `NdM keep K highest` expression string.
fn keep_highest_pool(count: u32, sides: u32, keep: u32) -> String {
    format!("{count}d{sides} keep {keep} highest")
}

proptest! {
    /// Invariant 1: `dice_values.len() == spec.count + (advantage_count ?? 0)`,
    /// and every rolled face lies within the die's face range.
    #[test]
    fn dice_values_length_matches_pool_size(count in 1u32..=20, sides in 2u32..=20) {
        let expr = parse(&plain_pool(count, sides), &no_vars()).unwrap();
        let result = roll(&expr).unwrap();
        prop_assert_eq!(result.dice_values.len(), count as usize);
        for &value in &result.dice_values {
            prop_assert!(value >= 1 && value <= sides as i64);
        }
    }

    /// Invariant 4: `min <= total <= max` for a plain pool (no reroll, so the
    /// documented reroll-limit edge case doesn't apply).
    #[test]
    fn total_stays_within_statistical_bounds_for_plain_pool(count in 1u32..=20, sides in 2u32..=20) {
        let expr = parse(&plain_pool(count, sides), &no_vars()).unwrap();
        let stats = analyze(&expr);
        let result = roll(&expr).unwrap();
        prop_assert!(result.total >= stats.minimum);
        prop_assert!(result.total <= stats.maximum);
    }

    /// Invariant 4, exercised over keep-highest pools too.
    #[test]
    fn total_stays_within_statistical_bounds_for_keep_pool(
        count in 2u32..=10,
        sides in 2u32..=20,
        keep_frac in 1u32..=100,
    ) {
        let keep = (1 + keep_frac % count).min(count);
        let expr = parse(&keep_highest_pool(count, sides, keep), &no_vars()).unwrap();
        let stats = analyze(&expr);
        let result = roll(&expr).unwrap();
        prop_assert!(result.total >= stats.minimum);
        prop_assert!(result.total <= stats.maximum);
    }

    /// Invariant 6: kept/discarded indices partition the pool exactly, with
    /// no overlap, whenever a keep clause is set.
    #[test]
    fn keep_selection_partitions_the_pool(
        count in 2u32..=10,
        sides in 2u32..=20,
        keep_frac in 1u32..=100,
    ) {
        let keep = (1 + keep_frac % count).min(count);
        let expr = parse(&keep_highest_pool(count, sides, keep), &no_vars()).unwrap();
        let result = roll(&expr).unwrap();
        prop_assert_eq!(
            result.kept_indices.len() + result.discarded_indices.len(),
            count as usize
        );
        prop_assert!(result.kept_indices.is_disjoint(&result.discarded_indices));
        prop_assert_eq!(result.kept_indices.len(), keep as usize);
    }
}
