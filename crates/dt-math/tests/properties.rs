//! Property-based tests for dt-math kernels.
//!
//! Uses proptest to verify smoothing and posterior properties across many random inputs.

use dt_math::{attribute_posteriors, ratio, trailing_moving_average, AttributeCounts};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn naive_moving_average(values: &[u64], window: usize) -> Vec<f64> {
    values
        .windows(window)
        .map(|w| w.iter().sum::<u64>() as f64 / window as f64)
        .collect()
}

// ============================================================================
// trailing_moving_average properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The incremental running sum agrees with recomputing every window.
    #[test]
    fn moving_average_matches_naive(
        values in prop::collection::vec(0u64..10_000, 1..64),
        window in 1usize..12,
    ) {
        let fast = trailing_moving_average(&values, window);
        let slow = if values.len() >= window { naive_moving_average(&values, window) } else { Vec::new() };
        prop_assert_eq!(fast.len(), slow.len());
        for (a, b) in fast.iter().zip(slow.iter()) {
            prop_assert!((a - b).abs() <= TOL, "fast={} naive={}", a, b);
        }
    }

    /// Output length is series length minus window plus one.
    #[test]
    fn moving_average_length(len in 0usize..64, window in 1usize..12) {
        let values = vec![1u64; len];
        let expected = if len >= window { len - window + 1 } else { 0 };
        prop_assert_eq!(trailing_moving_average(&values, window).len(), expected);
    }

    /// A constant series averages to that constant everywhere.
    #[test]
    fn moving_average_constant(k in 0u64..1_000_000, len in 6usize..48) {
        let values = vec![k; len];
        for avg in trailing_moving_average(&values, 6) {
            prop_assert_eq!(avg, k as f64);
        }
    }

    /// Every average lies between the series minimum and maximum.
    #[test]
    fn moving_average_bounded(values in prop::collection::vec(0u64..1_000, 6..40)) {
        let min = *values.iter().min().unwrap() as f64;
        let max = *values.iter().max().unwrap() as f64;
        for avg in trailing_moving_average(&values, 6) {
            prop_assert!(avg >= min - TOL && avg <= max + TOL);
        }
    }
}

// ============================================================================
// attribute_posteriors properties
// ============================================================================

fn counts_strategy() -> impl Strategy<Value = AttributeCounts> {
    (1u64..10_000, 1u64..10_000).prop_flat_map(|(total_views, total_demos)| {
        (0..=total_views, 0..=total_demos).prop_map(move |(true_views, true_demos)| {
            AttributeCounts {
                true_views,
                total_views,
                true_demos,
                total_demos,
            }
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Posteriors are never NaN or infinite, whatever the counts.
    #[test]
    fn posteriors_are_finite(counts in counts_strategy()) {
        let post = attribute_posteriors(&counts).expect("totals are non-zero");
        if let Some(p) = post.when_true {
            prop_assert!(p.is_finite() && p >= 0.0);
        }
        if let Some(p) = post.when_false {
            prop_assert!(p.is_finite() && p >= 0.0);
        }
    }

    /// The true branch is skipped exactly when the attribute never appears in views.
    #[test]
    fn true_branch_guard(counts in counts_strategy()) {
        let post = attribute_posteriors(&counts).expect("totals are non-zero");
        prop_assert_eq!(post.when_true.is_none(), counts.true_views == 0);
        prop_assert_eq!(post.when_false.is_none(), counts.true_views == counts.total_views);
    }

    /// Law of total probability: both branches, weighted by P(A=a), recover P(D).
    #[test]
    fn total_probability(counts in counts_strategy()) {
        prop_assume!(counts.true_views > 0 && counts.true_views < counts.total_views);
        let post = attribute_posteriors(&counts).expect("totals are non-zero");
        let p_true = ratio(counts.true_views, counts.total_views).unwrap();
        let p_demo = ratio(counts.total_demos, counts.total_views).unwrap();
        let recovered = post.when_true.unwrap() * p_true + post.when_false.unwrap() * (1.0 - p_true);
        prop_assert!((recovered - p_demo).abs() <= 1e-6 * p_demo.max(1.0),
            "recovered={} p_demo={}", recovered, p_demo);
    }
}
