//! Property-based tests for tensorboard-reducer
//!
//! - Reduction invariants (shape, ordering of mean/min/max, median bounds)
//! - Alignment invariants (relaxed truncation, column count)
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use tensorboard_reducer::align::{AlignPolicy, AlignmentEngine};
use tensorboard_reducer::reduce::{kernels, ReductionEngine};
use tensorboard_reducer::run::{DuplicateStepPolicy, RawSeries, RunScalars, RunStore};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Finite values in a range where sums stay exact enough to compare
fn arb_value() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6
}

/// `n_runs` equal-length series of `n_steps` values
fn arb_runs() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1usize..6, 1usize..40).prop_flat_map(|(n_runs, n_steps)| {
        proptest::collection::vec(proptest::collection::vec(arb_value(), n_steps), n_runs)
    })
}

/// Series of independent lengths (for relaxed alignment)
fn arb_ragged_runs() -> impl Strategy<Value = Vec<Vec<f64>>> {
    proptest::collection::vec(proptest::collection::vec(arb_value(), 1..30), 1..6)
}

fn store_of(runs: &[Vec<f64>]) -> RunStore {
    runs.iter()
        .enumerate()
        .map(|(i, values)| {
            RunScalars::builder(format!("run-{i}"))
                .series("loss", values)
                .build()
        })
        .collect()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: one reduced value per aligned step, for every op
    #[test]
    fn prop_reduced_length_matches_steps(runs in arb_runs()) {
        let events = AlignmentEngine::default().align(&store_of(&runs)).unwrap();
        let reduced = ReductionEngine::new()
            .reduce(&events, &["mean", "median", "std", "min", "max"])
            .unwrap();

        for (_, series) in reduced.iter() {
            prop_assert_eq!(series["loss"].len(), runs[0].len());
        }
    }

    /// Property: min <= median, mean <= max at every step
    #[test]
    fn prop_central_values_within_bounds(runs in arb_runs()) {
        let events = AlignmentEngine::default().align(&store_of(&runs)).unwrap();
        let reduced = ReductionEngine::new()
            .reduce(&events, &["mean", "median", "min", "max"])
            .unwrap();

        let get = |op: &str| reduced.get(op, "loss").unwrap().values().to_vec();
        let (mean, median, min, max) = (get("mean"), get("median"), get("min"), get("max"));

        for i in 0..mean.len() {
            let tol = 1e-9 * max[i].abs().max(min[i].abs()).max(1.0);
            prop_assert!(min[i] <= mean[i] + tol && mean[i] <= max[i] + tol);
            prop_assert!(min[i] <= median[i] && median[i] <= max[i]);
        }
    }

    /// Property: std is non-negative and zero for identical runs
    #[test]
    fn prop_std_non_negative(values in proptest::collection::vec(arb_value(), 1..20)) {
        prop_assert!(kernels::std(&values) >= 0.0);

        let same = vec![values[0]; values.len()];
        prop_assert!(kernels::std(&same).abs() < 1e-9 * values[0].abs().max(1.0));
    }

    /// Property: relaxed alignment truncates to the shortest run and keeps every run
    #[test]
    fn prop_relaxed_truncates_to_shortest(runs in arb_ragged_runs()) {
        let events = AlignmentEngine::new(AlignPolicy::relaxed())
            .align(&store_of(&runs))
            .unwrap();
        let loss = events.get("loss").unwrap();

        let shortest = runs.iter().map(Vec::len).min().unwrap();
        prop_assert_eq!(loss.shape(), (shortest, runs.len()));
        for (j, run) in runs.iter().enumerate() {
            prop_assert_eq!(loss.column(j), Some(run[..shortest].to_vec()));
        }
    }

    /// Property: finalized series have strictly increasing steps
    #[test]
    fn prop_finalize_strictly_increasing(
        points in proptest::collection::vec((0i64..50, arb_value()), 0..60)
    ) {
        let series = RawSeries::from_points(points)
            .finalize(DuplicateStepPolicy::KeepFirst, "run", "loss")
            .unwrap();
        prop_assert!(series.steps().windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(series.steps().len(), series.values().len());
    }
}
