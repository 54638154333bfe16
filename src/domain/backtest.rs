//! Backtest request, result, and the run that connects every stage.
//!
//! A run resolves each mix entry to a return series, blends them under the
//! requested rebalancing policy, then derives statistics, value curves and
//! the event log. Missing price data does not fail a run: it produces a
//! result carrying a [`DegradedData`] message instead.

use crate::domain::error::PortmixError;
use crate::domain::events::{events, RebalanceEvent};
use crate::domain::metrics::{ComparisonStats, PerformanceMetrics, SummaryStats};
use crate::domain::price::{BenchmarkId, PortfolioId};
use crate::domain::rebalance::RebalancePolicy;
use crate::domain::return_series::ReturnFrame;
use crate::domain::returns::{benchmark_returns, portfolio_returns};
use crate::domain::sanitize::Sanitize;
use crate::domain::simulator::simulate;
use crate::domain::time_series::TimeSeries;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One portfolio in the mix with its weight in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMixEntry {
    pub portfolio_id: PortfolioId,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    #[serde(alias = "portfolios")]
    pub portfolio_mix: Vec<PortfolioMixEntry>,
    pub benchmark_id: BenchmarkId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub rebalance_frequency: RebalancePolicy,
}

impl BacktestRequest {
    pub fn from_json(input: &str) -> Result<Self, PortmixError> {
        serde_json::from_str(input).map_err(|e| PortmixError::RequestParse {
            reason: e.to_string(),
        })
    }

    pub fn total_weight(&self) -> f64 {
        self.portfolio_mix.iter().map(|e| e.weight).sum()
    }

    /// Fractional target weights keyed by mix entry index.
    pub fn target_weights(&self) -> Vec<(usize, f64)> {
        self.portfolio_mix
            .iter()
            .enumerate()
            .map(|(i, e)| (i, e.weight / 100.0))
            .collect()
    }
}

/// Display row for one mix entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionSnapshot {
    pub name: String,
    pub weight: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub portfolio_type: String,
    pub currency: String,
}

impl Sanitize for CompositionSnapshot {
    fn sanitize(self) -> Self {
        CompositionSnapshot {
            weight: self.weight.sanitize(),
            ..self
        }
    }
}

/// Conditions under which a run returns a result without statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedData {
    NoPortfolioData,
    NoBlendedReturns,
}

impl DegradedData {
    pub fn message(&self) -> &'static str {
        match self {
            DegradedData::NoPortfolioData => "No portfolio data found for the specified date range",
            DegradedData::NoBlendedReturns => "Unable to calculate portfolio returns",
        }
    }
}

impl fmt::Display for DegradedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// `None` on degraded results, rendered as an empty object.
    #[serde(with = "metrics_or_empty")]
    pub performance_metrics: Option<PerformanceMetrics>,
    pub time_series: TimeSeries,
    pub portfolio_composition: Vec<CompositionSnapshot>,
    pub rebalancing_events: Vec<RebalanceEvent>,
    pub rebalancing_frequency: RebalancePolicy,
    pub calculation_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BacktestResult {
    fn degraded(
        reason: DegradedData,
        composition: Vec<CompositionSnapshot>,
        policy: RebalancePolicy,
        calculation_date: DateTime<Utc>,
    ) -> Self {
        BacktestResult {
            performance_metrics: None,
            time_series: TimeSeries::default(),
            portfolio_composition: composition,
            rebalancing_events: Vec::new(),
            rebalancing_frequency: policy,
            calculation_date,
            error: Some(reason.message().to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

impl Sanitize for BacktestResult {
    fn sanitize(self) -> Self {
        BacktestResult {
            performance_metrics: self.performance_metrics.sanitize(),
            time_series: self.time_series.sanitize(),
            portfolio_composition: self.portfolio_composition.sanitize(),
            rebalancing_events: self.rebalancing_events.sanitize(),
            ..self
        }
    }
}

mod metrics_or_empty {
    use crate::domain::metrics::PerformanceMetrics;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MetricsOrEmpty {
        Metrics(PerformanceMetrics),
        Empty {},
    }

    pub fn serialize<S: Serializer>(
        value: &Option<PerformanceMetrics>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(metrics) => metrics.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PerformanceMetrics>, D::Error> {
        Ok(match MetricsOrEmpty::deserialize(deserializer)? {
            MetricsOrEmpty::Metrics(metrics) => Some(metrics),
            MetricsOrEmpty::Empty {} => None,
        })
    }
}

/// Runs a backtest stamped with the current time.
pub fn run_backtest(
    data_port: &dyn DataPort,
    request: &BacktestRequest,
) -> Result<BacktestResult, PortmixError> {
    run_backtest_at(data_port, request, Utc::now())
}

/// Runs a backtest stamped with `calculation_date`.
///
/// The request is taken as given; callers validate it first.
#[tracing::instrument(
    skip(data_port, request, calculation_date),
    fields(
        entries = request.portfolio_mix.len(),
        benchmark_id = request.benchmark_id,
        policy = %request.rebalance_frequency,
    )
)]
pub fn run_backtest_at(
    data_port: &dyn DataPort,
    request: &BacktestRequest,
    calculation_date: DateTime<Utc>,
) -> Result<BacktestResult, PortmixError> {
    let policy = request.rebalance_frequency;
    let (start, end) = (request.start_date, request.end_date);
    let composition = composition_snapshot(data_port, request)?;

    let mut columns = Vec::with_capacity(request.portfolio_mix.len());
    for (index, entry) in request.portfolio_mix.iter().enumerate() {
        let series = portfolio_returns(data_port, entry.portfolio_id, start, end)?;
        tracing::debug!(
            portfolio_id = entry.portfolio_id,
            returns = series.len(),
            "portfolio returns resolved"
        );
        columns.push((index, series));
    }

    let frame = ReturnFrame::from_series(columns);
    if frame.is_empty() {
        tracing::warn!("no portfolio returns in range");
        return Ok(BacktestResult::degraded(
            DegradedData::NoPortfolioData,
            composition,
            policy,
            calculation_date,
        )
        .sanitize());
    }

    let simulation = simulate(&frame, &request.target_weights(), policy);
    if simulation.blended.is_empty() {
        tracing::warn!("blended return series is empty");
        return Ok(BacktestResult::degraded(
            DegradedData::NoBlendedReturns,
            composition,
            policy,
            calculation_date,
        )
        .sanitize());
    }

    let benchmark = benchmark_returns(data_port, request.benchmark_id, start, end);
    let summary = SummaryStats::compute(&simulation.blended);
    let comparison = ComparisonStats::compute(&simulation.blended, &benchmark);
    let metrics = PerformanceMetrics::from_stats(&summary, &comparison);

    tracing::info!(
        days = simulation.blended.len(),
        rebalances = simulation.rebalance_dates.len(),
        total_return = metrics.total_return,
        "backtest complete"
    );

    let result = BacktestResult {
        performance_metrics: Some(metrics),
        time_series: TimeSeries::build(&simulation.blended, &benchmark),
        portfolio_composition: composition,
        rebalancing_events: events(policy, start, end),
        rebalancing_frequency: policy,
        calculation_date,
        error: None,
    };
    Ok(result.sanitize())
}

fn composition_snapshot(
    data_port: &dyn DataPort,
    request: &BacktestRequest,
) -> Result<Vec<CompositionSnapshot>, PortmixError> {
    request
        .portfolio_mix
        .iter()
        .map(|entry| {
            let snapshot = match data_port.get_portfolio(entry.portfolio_id)? {
                Some(p) => CompositionSnapshot {
                    name: p.name,
                    weight: entry.weight,
                    category: p.category,
                    portfolio_type: p.portfolio_type,
                    currency: p.base_currency,
                },
                None => CompositionSnapshot {
                    name: format!("Portfolio {} (Not Found)", entry.portfolio_id),
                    weight: entry.weight,
                    category: "N/A".to_string(),
                    portfolio_type: "N/A".to_string(),
                    currency: "USD".to_string(),
                },
            };
            Ok(snapshot)
        })
        .collect()
}
