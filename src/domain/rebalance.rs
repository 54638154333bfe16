//! Rebalancing policy and the schedule of rebalance dates it implies.

use crate::domain::error::PortmixError;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalancePolicy {
    #[default]
    Never,
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
}

impl RebalancePolicy {
    pub const ALL: [RebalancePolicy; 5] = [
        RebalancePolicy::Never,
        RebalancePolicy::Monthly,
        RebalancePolicy::Quarterly,
        RebalancePolicy::SemiAnnually,
        RebalancePolicy::Annually,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RebalancePolicy::Never => "never",
            RebalancePolicy::Monthly => "monthly",
            RebalancePolicy::Quarterly => "quarterly",
            RebalancePolicy::SemiAnnually => "semi_annually",
            RebalancePolicy::Annually => "annually",
        }
    }

    /// Calendar months between scheduled rebalances; `None` for `never`.
    pub fn period_months(&self) -> Option<u32> {
        match self {
            RebalancePolicy::Never => None,
            RebalancePolicy::Monthly => Some(1),
            RebalancePolicy::Quarterly => Some(3),
            RebalancePolicy::SemiAnnually => Some(6),
            RebalancePolicy::Annually => Some(12),
        }
    }
}

impl fmt::Display for RebalancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebalancePolicy {
    type Err = PortmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RebalancePolicy::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| PortmixError::RequestParse {
                reason: format!(
                    "unknown rebalance frequency '{}' (expected never, monthly, quarterly, semi_annually or annually)",
                    s
                ),
            })
    }
}

/// Dates reached by stepping from `start` by the policy's period while on or
/// before `end`. Each step starts from the previous stepped date, and a day
/// past the end of the target month is clamped to its last day.
pub fn stepped_dates(policy: RebalancePolicy, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let Some(months) = policy.period_months() else {
        return Vec::new();
    };

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        match current.checked_add_months(Months::new(months)) {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

/// Rebalance dates over a trading index: the stepped dates from the first to
/// the last index date that are themselves in the index.
pub fn schedule(policy: RebalancePolicy, index: &[NaiveDate]) -> Vec<NaiveDate> {
    let (Some(&first), Some(&last)) = (index.first(), index.last()) else {
        return Vec::new();
    };
    stepped_dates(policy, first, last)
        .into_iter()
        .filter(|d| index.binary_search(d).is_ok())
        .collect()
}
