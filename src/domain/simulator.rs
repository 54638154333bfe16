//! Rebalancing simulator: blends per-portfolio returns into one series.
//!
//! Periodic policies run a fold over [`SimState`] driven by [`step`], starting
//! from the first index date; that date only sets the initial allocation and
//! has no blended return. The `never` policy blends every date with the
//! unchanged target weights, which amounts to a continuously rebalanced mix
//! rather than buy-and-hold drift.

use crate::domain::rebalance::{self, RebalancePolicy};
use crate::domain::return_series::{ReturnFrame, ReturnSeries};
use chrono::NaiveDate;

/// Notional value every simulation and value curve starts from.
pub const INITIAL_VALUE: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    pub weights: Vec<f64>,
    pub value: f64,
}

impl SimState {
    pub fn initial(targets: &[f64]) -> Self {
        Self {
            weights: targets.to_vec(),
            value: INITIAL_VALUE,
        }
    }
}

/// Outcome of one simulated day.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: SimState,
    /// Weights the day's return was blended with.
    pub applied_weights: Vec<f64>,
    pub blended_return: f64,
}

/// Advances the state by one day.
///
/// On a rebalance day the weights are first reset to `targets`. After the
/// value update the weights drift with each column's return relative to the
/// blend; a zero blend leaves them unchanged.
pub fn step(state: SimState, targets: &[f64], day_returns: &[f64], is_rebalance: bool) -> StepOutcome {
    let applied = if is_rebalance {
        targets.to_vec()
    } else {
        state.weights
    };

    let blended: f64 = applied
        .iter()
        .zip(day_returns)
        .map(|(w, r)| w * r)
        .sum();

    let value = state.value * (1.0 + blended);

    let weights = if blended != 0.0 {
        applied
            .iter()
            .zip(day_returns)
            .map(|(w, r)| w * (1.0 + r) / (1.0 + blended))
            .collect()
    } else {
        applied.clone()
    };

    StepOutcome {
        state: SimState { weights, value },
        applied_weights: applied,
        blended_return: blended,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Simulation {
    pub blended: ReturnSeries,
    /// Starting value followed by the value after each blended date; one
    /// element longer than `blended`.
    pub values: Vec<f64>,
    /// Weights used on each date, in frame key order.
    pub applied_weights: Vec<Vec<f64>>,
    pub rebalance_dates: Vec<NaiveDate>,
}

/// Blends the frame's columns under `policy`.
///
/// `targets` maps frame keys to fractional weights; keys without a target
/// carry zero weight.
pub fn simulate(frame: &ReturnFrame, targets: &[(usize, f64)], policy: RebalancePolicy) -> Simulation {
    if frame.is_empty() {
        return Simulation::default();
    }

    let target_vec: Vec<f64> = frame
        .keys()
        .iter()
        .map(|key| {
            targets
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, w)| *w)
                .unwrap_or(0.0)
        })
        .collect();

    match policy {
        RebalancePolicy::Never => fixed_weight_blend(frame, &target_vec),
        _ => rebalanced_blend(frame, &target_vec, policy),
    }
}

fn fixed_weight_blend(frame: &ReturnFrame, targets: &[f64]) -> Simulation {
    let mut points = Vec::with_capacity(frame.len());
    let mut values = Vec::with_capacity(frame.len() + 1);
    values.push(INITIAL_VALUE);

    for (row, date) in frame.dates().iter().enumerate() {
        let blended: f64 = targets
            .iter()
            .zip(frame.row(row))
            .map(|(w, r)| w * r)
            .sum();
        let prev = values[values.len() - 1];
        values.push(prev * (1.0 + blended));
        points.push((*date, blended));
    }

    Simulation {
        blended: ReturnSeries::from_points(frame.base_date, points),
        values,
        applied_weights: vec![targets.to_vec(); frame.len()],
        rebalance_dates: Vec::new(),
    }
}

fn rebalanced_blend(frame: &ReturnFrame, targets: &[f64], policy: RebalancePolicy) -> Simulation {
    let dates = frame.dates();
    let rebalance_dates = rebalance::schedule(policy, dates);
    tracing::debug!(
        policy = %policy,
        rebalances = rebalance_dates.len(),
        "simulating rebalanced blend"
    );

    // The first index date is the initial allocation and is not stepped.
    let mut values = Vec::with_capacity(frame.len());
    values.push(INITIAL_VALUE);
    let mut applied_weights = Vec::with_capacity(frame.len().saturating_sub(1));

    let mut state = SimState::initial(targets);
    for (row, date) in dates.iter().enumerate().skip(1) {
        let is_rebalance = rebalance_dates.binary_search(date).is_ok();
        let outcome = step(state, targets, &frame.row(row), is_rebalance);
        values.push(outcome.state.value);
        applied_weights.push(outcome.applied_weights);
        state = outcome.state;
    }

    let points = dates
        .iter()
        .skip(1)
        .zip(values.windows(2))
        .map(|(date, w)| (*date, w[1] / w[0] - 1.0))
        .collect();

    Simulation {
        blended: ReturnSeries::from_points(dates.first().copied(), points),
        values,
        applied_weights,
        rebalance_dates,
    }
}
