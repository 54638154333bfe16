//! Performance and benchmark-relative statistics.

use crate::domain::error::PortmixError;
use crate::domain::return_series::{compounded, ReturnSeries};
use crate::domain::sanitize::{finite_or_zero, round_to, Sanitize};
use serde::{Deserialize, Serialize};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annual risk-free rate used for alpha.
pub const RISK_FREE_RATE: f64 = 0.03;

/// Summary statistics of a blended return series, as fractions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryStats {
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Largest peak-to-trough decline, zero or negative.
    pub max_drawdown: f64,
    pub total_return: f64,
}

impl SummaryStats {
    /// Full statistics, or the reduced fallback set when the full routine
    /// cannot run on this series. Never fails.
    pub fn compute(returns: &ReturnSeries) -> Self {
        let values = returns.values();
        let total_return = if values.is_empty() {
            0.0
        } else {
            finite_or_zero(compounded(values))
        };

        let stats = match full_stats(values) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to basic statistics");
                fallback_stats(values)
            }
        };

        SummaryStats {
            total_return,
            ..stats
        }
    }
}

fn full_stats(returns: &[f64]) -> Result<SummaryStats, PortmixError> {
    if returns.is_empty() {
        return Err(PortmixError::Computation {
            reason: "no returns to analyze".into(),
        });
    }
    if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
        return Err(PortmixError::Computation {
            reason: format!("non-finite return {}", bad),
        });
    }

    let n = returns.len() as f64;
    let years = n / TRADING_DAYS_PER_YEAR;
    let annual_return = (1.0 + compounded(returns)).powf(1.0 / years) - 1.0;

    let mean = mean(returns);
    let stddev = sample_stddev(returns);
    let annual_volatility = stddev * TRADING_DAYS_PER_YEAR.sqrt();
    let sharpe_ratio = mean / stddev * TRADING_DAYS_PER_YEAR.sqrt();

    let downside = returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / n;
    let annual_downside = downside.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();
    let sortino_ratio = mean * TRADING_DAYS_PER_YEAR / annual_downside;

    Ok(SummaryStats {
        annual_return: finite_or_zero(annual_return),
        annual_volatility: finite_or_zero(annual_volatility),
        sharpe_ratio: finite_or_zero(sharpe_ratio),
        sortino_ratio: finite_or_zero(sortino_ratio),
        max_drawdown: finite_or_zero(max_drawdown(returns)),
        total_return: 0.0,
    })
}

fn fallback_stats(returns: &[f64]) -> SummaryStats {
    let finite: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    SummaryStats {
        annual_return: finite_or_zero(mean(&finite) * TRADING_DAYS_PER_YEAR),
        annual_volatility: finite_or_zero(sample_stddev(&finite) * TRADING_DAYS_PER_YEAR.sqrt()),
        ..SummaryStats::default()
    }
}

/// Drawdown over the value path that starts at 1 before the first return.
fn max_drawdown(returns: &[f64]) -> f64 {
    let mut value = 1.0_f64;
    let mut peak = value;
    let mut max_dd = 0.0_f64;

    for r in returns {
        value *= 1.0 + r;
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = value / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    var.sqrt()
}

/// Blend statistics relative to the benchmark, as fractions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonStats {
    pub benchmark_return: f64,
    pub excess_return: f64,
    pub beta: f64,
    pub alpha: f64,
}

impl ComparisonStats {
    /// Compares the two series on the dates they share. Fewer than two shared
    /// dates gives all zeros.
    pub fn compute(portfolio: &ReturnSeries, benchmark: &ReturnSeries) -> Self {
        if portfolio.is_empty() || benchmark.is_empty() {
            return Self::default();
        }

        let aligned = portfolio.inner_join(benchmark);
        if aligned.len() < 2 {
            tracing::debug!(aligned = aligned.len(), "too few aligned points for comparison");
            return Self::default();
        }

        let port: Vec<f64> = aligned.iter().map(|(_, p, _)| *p).collect();
        let bench: Vec<f64> = aligned.iter().map(|(_, _, b)| *b).collect();

        let benchmark_return = finite_or_zero(compounded(&bench));
        let portfolio_return = finite_or_zero(compounded(&port));
        let excess_return = portfolio_return - benchmark_return;

        let beta = beta(&port, &bench);

        let port_annual = (1.0 + mean(&port)).powf(TRADING_DAYS_PER_YEAR) - 1.0;
        let bench_annual = (1.0 + mean(&bench)).powf(TRADING_DAYS_PER_YEAR) - 1.0;
        let alpha = finite_or_zero(
            (port_annual - RISK_FREE_RATE) - beta * (bench_annual - RISK_FREE_RATE),
        );

        ComparisonStats {
            benchmark_return,
            excess_return,
            beta,
            alpha,
        }
    }
}

/// Sample covariance over population variance of the benchmark.
fn beta(port: &[f64], bench: &[f64]) -> f64 {
    let n = port.len() as f64;
    let mp = mean(port);
    let mb = mean(bench);

    let covariance = port
        .iter()
        .zip(bench)
        .map(|(p, b)| (p - mp) * (b - mb))
        .sum::<f64>()
        / (n - 1.0);
    let variance = bench.iter().map(|b| (b - mb).powi(2)).sum::<f64>() / n;

    if variance == 0.0 || !covariance.is_finite() || !variance.is_finite() {
        return 0.0;
    }
    finite_or_zero(covariance / variance)
}

/// Reported metrics: percentages rounded to 2 dp, ratios to 3 dp.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub sortino_ratio: f64,
    pub total_return: f64,
    pub benchmark_return: f64,
    pub excess_return: f64,
    pub beta: f64,
    pub alpha: f64,
}

impl PerformanceMetrics {
    pub fn from_stats(summary: &SummaryStats, comparison: &ComparisonStats) -> Self {
        PerformanceMetrics {
            annual_return: round_to(summary.annual_return * 100.0, 2),
            volatility: round_to(summary.annual_volatility * 100.0, 2),
            sharpe_ratio: round_to(summary.sharpe_ratio, 3),
            max_drawdown: round_to(summary.max_drawdown * 100.0, 2),
            sortino_ratio: round_to(summary.sortino_ratio, 3),
            total_return: round_to(summary.total_return * 100.0, 2),
            benchmark_return: round_to(comparison.benchmark_return * 100.0, 2),
            excess_return: round_to(comparison.excess_return * 100.0, 2),
            beta: round_to(comparison.beta, 3),
            alpha: round_to(comparison.alpha * 100.0, 2),
        }
    }
}

impl Sanitize for PerformanceMetrics {
    fn sanitize(self) -> Self {
        PerformanceMetrics {
            annual_return: self.annual_return.sanitize(),
            volatility: self.volatility.sanitize(),
            sharpe_ratio: self.sharpe_ratio.sanitize(),
            max_drawdown: self.max_drawdown.sanitize(),
            sortino_ratio: self.sortino_ratio.sanitize(),
            total_return: self.total_return.sanitize(),
            benchmark_return: self.benchmark_return.sanitize(),
            excess_return: self.excess_return.sanitize(),
            beta: self.beta.sanitize(),
            alpha: self.alpha.sanitize(),
        }
    }
}
