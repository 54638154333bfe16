//! Rebalance event log shown alongside a backtest.

use crate::domain::rebalance::{stepped_dates, RebalancePolicy};
use crate::domain::sanitize::Sanitize;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder cost attached to every rebalance; no cost model is applied.
pub const ESTIMATED_REBALANCE_COST: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceEvent {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub event_type: String,
    pub description: String,
    pub estimated_cost: f64,
}

/// One event per scheduled calendar date in `[start, end]` except the first,
/// which is the initial allocation.
pub fn events(policy: RebalancePolicy, start: NaiveDate, end: NaiveDate) -> Vec<RebalanceEvent> {
    stepped_dates(policy, start, end)
        .into_iter()
        .skip(1)
        .map(|date| RebalanceEvent {
            date,
            event_type: format!("{}_rebalance", policy),
            description: "Rebalanced portfolio back to target weights".to_string(),
            estimated_cost: ESTIMATED_REBALANCE_COST,
        })
        .collect()
}

impl Sanitize for RebalanceEvent {
    fn sanitize(self) -> Self {
        RebalanceEvent {
            estimated_cost: self.estimated_cost.sanitize(),
            ..self
        }
    }
}
