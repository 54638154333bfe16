//! Chart-ready cumulative value curves for the blend and the benchmark.

use crate::domain::return_series::ReturnSeries;
use crate::domain::sanitize::{round_to, Sanitize};
use crate::domain::simulator::INITIAL_VALUE;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    pub dates: Vec<NaiveDate>,
    pub portfolio_values: Vec<f64>,
    pub benchmark_values: Vec<f64>,
}

impl TimeSeries {
    /// Value curves starting at [`INITIAL_VALUE`].
    ///
    /// When the blend knows its base date, the curves open with an anchor
    /// point at that date. The benchmark only keeps the blend dates it also
    /// has returns for; with no overlap at all it is drawn flat.
    pub fn build(blended: &ReturnSeries, benchmark: &ReturnSeries) -> Self {
        if blended.is_empty() {
            return Self::default();
        }

        let anchor = blended.base_date.filter(|d| Some(*d) < blended.first_date());

        let mut dates: Vec<NaiveDate> = anchor.into_iter().collect();
        dates.extend_from_slice(blended.dates());

        let portfolio_values = value_curve(blended.values(), anchor.is_some());

        let aligned: Vec<f64> = blended
            .inner_join(benchmark)
            .into_iter()
            .map(|(_, _, b)| b)
            .collect();
        let benchmark_values = if aligned.is_empty() {
            vec![INITIAL_VALUE; dates.len()]
        } else {
            value_curve(&aligned, anchor.is_some())
        };

        TimeSeries {
            dates,
            portfolio_values,
            benchmark_values,
        }
    }
}

fn value_curve(returns: &[f64], anchored: bool) -> Vec<f64> {
    let mut values = Vec::with_capacity(returns.len() + 1);
    if anchored {
        values.push(INITIAL_VALUE);
    }
    let mut growth = 1.0_f64;
    for r in returns {
        growth *= 1.0 + r;
        values.push(growth * INITIAL_VALUE);
    }
    values
        .into_iter()
        .map(|v| {
            if v.is_finite() {
                round_to(v, 2)
            } else {
                INITIAL_VALUE
            }
        })
        .collect()
}

impl Sanitize for TimeSeries {
    fn sanitize(self) -> Self {
        TimeSeries {
            dates: self.dates,
            portfolio_values: self.portfolio_values.sanitize(),
            benchmark_values: self.benchmark_values.sanitize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn blend() -> ReturnSeries {
        ReturnSeries::from_points(Some(d(1)), vec![(d(2), 0.02), (d(3), 0.02)])
    }

    #[test]
    fn blend_curve_starts_at_initial_value() {
        let ts = TimeSeries::build(&blend(), &ReturnSeries::empty());

        assert_eq!(ts.dates, vec![d(1), d(2), d(3)]);
        assert_eq!(ts.portfolio_values, vec![100_000.0, 102_000.0, 104_040.0]);
    }

    #[test]
    fn empty_benchmark_is_flat() {
        let ts = TimeSeries::build(&blend(), &ReturnSeries::empty());
        assert_eq!(ts.benchmark_values, vec![100_000.0; 3]);
    }

    #[test]
    fn benchmark_aligned_to_blend_dates() {
        let bench = ReturnSeries::from_points(
            Some(d(1)),
            vec![(d(2), 0.01), (d(3), -0.01), (d(9), 0.5)],
        );
        let ts = TimeSeries::build(&blend(), &bench);

        assert_eq!(ts.benchmark_values, vec![100_000.0, 101_000.0, 99_990.0]);
    }

    #[test]
    fn benchmark_without_overlap_is_flat() {
        let bench = ReturnSeries::from_points(Some(d(10)), vec![(d(11), 0.01)]);
        let ts = TimeSeries::build(&blend(), &bench);
        assert_eq!(ts.benchmark_values, vec![100_000.0; 3]);
    }

    #[test]
    fn no_anchor_without_base_date() {
        let blended = ReturnSeries::from_points(None, vec![(d(2), 0.1)]);
        let ts = TimeSeries::build(&blended, &ReturnSeries::empty());
        assert_eq!(ts.dates, vec![d(2)]);
        assert_eq!(ts.portfolio_values, vec![110_000.0]);
    }

    #[test]
    fn non_finite_values_fall_back_to_initial() {
        let blended = ReturnSeries::from_points(Some(d(1)), vec![(d(2), f64::INFINITY)]);
        let ts = TimeSeries::build(&blended, &ReturnSeries::empty());
        assert_eq!(ts.portfolio_values, vec![100_000.0, 100_000.0]);
    }

    #[test]
    fn empty_blend_gives_empty_series() {
        let ts = TimeSeries::build(&ReturnSeries::empty(), &blend());
        assert!(ts.dates.is_empty());
        assert!(ts.portfolio_values.is_empty());
        assert!(ts.benchmark_values.is_empty());
    }
}
