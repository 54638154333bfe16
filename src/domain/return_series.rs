//! Date-indexed return series and the zero-filled frame the simulator reads.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Ordered `(date, return)` points with strictly increasing dates.
///
/// `base_date` is the date of the observation the first return is measured
/// from. It anchors value curves at the initial notional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    pub base_date: Option<NaiveDate>,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a series from unordered points. A later point for an already
    /// seen date replaces the earlier one.
    pub fn from_points(base_date: Option<NaiveDate>, points: Vec<(NaiveDate, f64)>) -> Self {
        let map: BTreeMap<NaiveDate, f64> = points.into_iter().collect();
        Self::from_map(base_date, map)
    }

    pub fn from_map(base_date: Option<NaiveDate>, map: BTreeMap<NaiveDate, f64>) -> Self {
        let (dates, values) = map.into_iter().unzip();
        Self {
            base_date,
            dates,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|i| self.values[i])
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            base_date: self.base_date,
            dates: self.dates.clone(),
            values: self.values.iter().map(|r| r * factor).collect(),
        }
    }

    /// `Π(1 + r) − 1`, zero for an empty series.
    pub fn total_return(&self) -> f64 {
        compounded(&self.values)
    }

    /// Sums several series over the union of their dates. A date missing from
    /// one series contributes zero for that series.
    pub fn sum_aligned(series: &[ReturnSeries]) -> Self {
        let mut map: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for s in series {
            for (date, value) in s.iter() {
                *map.entry(date).or_insert(0.0) += value;
            }
        }
        let base_date = series.iter().filter_map(|s| s.base_date).min();
        Self::from_map(base_date, map)
    }

    /// Pairs of values on the dates both series share, in date order.
    pub fn inner_join(&self, other: &ReturnSeries) -> Vec<(NaiveDate, f64, f64)> {
        self.iter()
            .filter_map(|(date, a)| other.get(date).map(|b| (date, a, b)))
            .collect()
    }
}

pub fn compounded(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Return columns aligned on one shared date index, keyed by mix entry.
///
/// Dates absent from a column's source series are filled with zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnFrame {
    pub base_date: Option<NaiveDate>,
    dates: Vec<NaiveDate>,
    keys: Vec<usize>,
    columns: Vec<Vec<f64>>,
}

impl ReturnFrame {
    pub fn from_series(series: Vec<(usize, ReturnSeries)>) -> Self {
        let index: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|(_, s)| s.dates().iter().copied())
            .collect();
        let dates: Vec<NaiveDate> = index.into_iter().collect();
        let base_date = series.iter().filter_map(|(_, s)| s.base_date).min();

        let mut keys = Vec::with_capacity(series.len());
        let mut columns = Vec::with_capacity(series.len());
        for (key, s) in &series {
            let column = dates.iter().map(|d| s.get(*d).unwrap_or(0.0)).collect();
            keys.push(*key);
            columns.push(column);
        }

        Self {
            base_date,
            dates,
            keys,
            columns,
        }
    }

    /// True when no column has any data, so there is no date index at all.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn keys(&self) -> &[usize] {
        &self.keys
    }

    pub fn column(&self, key: usize) -> Option<&[f64]> {
        self.keys
            .iter()
            .position(|k| *k == key)
            .map(|i| self.columns[i].as_slice())
    }

    /// Every column's return on row `row`, in key order.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[row]).collect()
    }
}
