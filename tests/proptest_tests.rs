//! Property-based tests for the simulator, value curves and sanitizer.
//!
//! These tests verify that:
//! 1. The `never` policy blends with the target weights on every date
//! 2. Periodic policies are back on target after every scheduled rebalance
//! 3. Value paths and time series follow the compounding recurrence
//! 4. Sanitizing is idempotent and leaves only finite numbers
//! 5. Rebalance events stay inside the horizon and skip its first date

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use portmix::domain::events::events;
use portmix::domain::rebalance::RebalancePolicy;
use portmix::domain::return_series::{ReturnFrame, ReturnSeries};
use portmix::domain::sanitize::Sanitize;
use portmix::domain::simulator::{simulate, INITIAL_VALUE};
use portmix::domain::time_series::TimeSeries;

fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(offset as i64)
}

fn policy_strategy() -> impl Strategy<Value = RebalancePolicy> {
    prop_oneof![
        Just(RebalancePolicy::Never),
        Just(RebalancePolicy::Monthly),
        Just(RebalancePolicy::Quarterly),
        Just(RebalancePolicy::SemiAnnually),
        Just(RebalancePolicy::Annually),
    ]
}

/// A frame of `columns` daily return series over `len` consecutive days,
/// plus fractional target weights summing to one.
fn frame_strategy() -> impl Strategy<Value = (ReturnFrame, Vec<(usize, f64)>)> {
    (2usize..5, 1usize..200).prop_flat_map(|(columns, len)| {
        (
            prop::collection::vec(prop::collection::vec(-0.2..0.2f64, len), columns),
            prop::collection::vec(1.0..100.0f64, columns),
        )
            .prop_map(|(returns, raw_weights)| {
                let series = returns
                    .into_iter()
                    .enumerate()
                    .map(|(key, column)| {
                        let points = column.into_iter().enumerate().map(|(i, r)| (day(i + 1), r)).collect();
                        (key, ReturnSeries::from_points(Some(day(0)), points))
                    })
                    .collect();
                let total: f64 = raw_weights.iter().sum();
                let targets = raw_weights
                    .iter()
                    .enumerate()
                    .map(|(key, w)| (key, w / total))
                    .collect();
                (ReturnFrame::from_series(series), targets)
            })
    })
}

fn messy_number() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e6..1.0e6f64,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

// ============================================================================
// Simulator properties
// ============================================================================

proptest! {
    #[test]
    fn never_blends_with_targets((frame, targets) in frame_strategy()) {
        let sim = simulate(&frame, &targets, RebalancePolicy::Never);

        prop_assert_eq!(sim.blended.len(), frame.len());
        for (row, r) in sim.blended.values().iter().enumerate() {
            let expected: f64 = targets
                .iter()
                .zip(frame.row(row))
                .map(|((_, w), x)| w * x)
                .sum();
            assert_relative_eq!(*r, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn scheduled_dates_reset_to_targets(
        (frame, targets) in frame_strategy(),
        policy in policy_strategy(),
    ) {
        let sim = simulate(&frame, &targets, policy);
        let target_vec: Vec<f64> = targets.iter().map(|(_, w)| *w).collect();

        for (step, date) in sim.blended.dates().iter().enumerate() {
            if sim.rebalance_dates.binary_search(date).is_ok() {
                prop_assert_eq!(&sim.applied_weights[step], &target_vec);
            }
        }
    }

    #[test]
    fn drifted_weights_stay_normalized(
        (frame, targets) in frame_strategy(),
        policy in policy_strategy(),
    ) {
        let sim = simulate(&frame, &targets, policy);
        for weights in &sim.applied_weights {
            assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn value_path_compounds_blend(
        (frame, targets) in frame_strategy(),
        policy in policy_strategy(),
    ) {
        let sim = simulate(&frame, &targets, policy);

        prop_assert_eq!(sim.values.len(), sim.blended.len() + 1);
        prop_assert_eq!(sim.values[0], INITIAL_VALUE);
        for (t, r) in sim.blended.values().iter().enumerate() {
            assert_relative_eq!(
                sim.values[t + 1],
                sim.values[t] * (1.0 + r),
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn time_series_starts_at_initial_value(
        (frame, targets) in frame_strategy(),
        policy in policy_strategy(),
    ) {
        let sim = simulate(&frame, &targets, policy);
        let ts = TimeSeries::build(&sim.blended, &ReturnSeries::empty());

        if sim.blended.is_empty() {
            prop_assert!(ts.dates.is_empty());
        } else {
            prop_assert_eq!(ts.dates.len(), sim.blended.len() + 1);
            prop_assert_eq!(ts.portfolio_values[0], INITIAL_VALUE);
            prop_assert_eq!(&ts.benchmark_values, &vec![INITIAL_VALUE; ts.dates.len()]);
            for (t, r) in sim.blended.values().iter().enumerate() {
                // Both sides are rounded to cents.
                let tolerance = 0.02 + ts.portfolio_values[t].abs() * 1e-9;
                prop_assert!(
                    (ts.portfolio_values[t + 1] - ts.portfolio_values[t] * (1.0 + r)).abs() <= tolerance
                );
            }
        }
    }
}

// ============================================================================
// Sanitizer and event log properties
// ============================================================================

proptest! {
    #[test]
    fn sanitize_is_idempotent(values in prop::collection::vec(messy_number(), 0..50)) {
        let once = values.sanitize();
        let twice = once.clone().sanitize();

        prop_assert!(once.iter().all(|v| v.is_finite()));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn events_stay_inside_horizon(
        policy in policy_strategy(),
        start_offset in 0usize..400,
        span in 0usize..1500,
    ) {
        let start = day(start_offset);
        let end = day(start_offset + span);
        let log = events(policy, start, end);

        if policy == RebalancePolicy::Never {
            prop_assert!(log.is_empty());
        }
        for pair in log.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
        for event in &log {
            prop_assert!(event.date > start);
            prop_assert!(event.date <= end);
            prop_assert_eq!(&event.event_type, &format!("{}_rebalance", policy));
        }
    }
}
