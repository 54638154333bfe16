//! Return calculator: prices to daily returns, and constituents to one
//! per-portfolio series.

use crate::domain::error::PortmixError;
use crate::domain::price::{BenchmarkId, PortfolioId, PriceObservation};
use crate::domain::return_series::ReturnSeries;
use crate::domain::sanitize::plain_number;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Simple returns `p[t] / p[t-1] - 1` for each consecutive pair.
///
/// Fewer than two observations give an empty series. A pair whose previous
/// price is zero has no defined return and is left out.
pub fn returns(prices: &[PriceObservation]) -> ReturnSeries {
    let Some(first) = prices.first() else {
        return ReturnSeries::empty();
    };

    let mut points = Vec::with_capacity(prices.len().saturating_sub(1));
    for pair in prices.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        match ratio(prev.adjusted_close, curr.adjusted_close) {
            Some(r) => points.push((curr.date, r - 1.0)),
            None => tracing::warn!(
                date = %curr.date,
                previous = %prev.adjusted_close,
                "undefined return, dropping observation"
            ),
        }
    }

    ReturnSeries::from_points(Some(first.date), points)
}

fn ratio(prev: Decimal, curr: Decimal) -> Option<f64> {
    if prev.is_zero() {
        return None;
    }
    curr.checked_div(prev)
        .and_then(|r| r.to_f64())
        .filter(|r| r.is_finite())
}

/// One portfolio's return series over `[start_date, end_date]`.
///
/// Each constituent effective on or before `end_date` contributes its own
/// returns scaled by its composition weight; contributions are summed over
/// the union of dates. Unknown portfolios and constituents without prices
/// contribute nothing.
#[tracing::instrument(skip(data_port))]
pub fn portfolio_returns(
    data_port: &dyn DataPort,
    portfolio_id: PortfolioId,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<ReturnSeries, PortmixError> {
    if data_port.get_portfolio(portfolio_id)?.is_none() {
        tracing::warn!(portfolio_id, "portfolio does not exist");
        return Ok(ReturnSeries::empty());
    }

    let composition = data_port.get_composition(portfolio_id, end_date)?;
    tracing::debug!(portfolio_id, entries = composition.len(), "loaded composition");

    let mut contributions = Vec::new();
    for entry in composition.iter().filter(|e| e.effective_date <= end_date) {
        let prices = data_port.get_prices(entry.asset_id, start_date, end_date)?;
        if prices.is_empty() {
            tracing::debug!(symbol = %entry.symbol, "no price data for asset");
            continue;
        }

        let weight = plain_number(entry.weight);

        let asset_returns = returns(&prices);
        tracing::debug!(
            symbol = %entry.symbol,
            observations = prices.len(),
            returns = asset_returns.len(),
            weight,
            "asset returns computed"
        );
        contributions.push(asset_returns.scaled(weight));
    }

    if contributions.is_empty() {
        tracing::warn!(portfolio_id, "no asset returns resolved");
        return Ok(ReturnSeries::empty());
    }

    Ok(ReturnSeries::sum_aligned(&contributions))
}

/// The benchmark's return series, resolved through the asset that carries
/// the benchmark's symbol.
///
/// Absence of the benchmark, its asset, or its prices gives an empty series,
/// and so does a failing data port.
#[tracing::instrument(skip(data_port))]
pub fn benchmark_returns(
    data_port: &dyn DataPort,
    benchmark_id: BenchmarkId,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> ReturnSeries {
    match try_benchmark_returns(data_port, benchmark_id, start_date, end_date) {
        Ok(series) => series,
        Err(e) => {
            tracing::warn!(benchmark_id, error = %e, "failed to load benchmark returns");
            ReturnSeries::empty()
        }
    }
}

fn try_benchmark_returns(
    data_port: &dyn DataPort,
    benchmark_id: BenchmarkId,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<ReturnSeries, PortmixError> {
    let Some(benchmark) = data_port.get_benchmark(benchmark_id)? else {
        tracing::warn!(benchmark_id, "benchmark not found");
        return Ok(ReturnSeries::empty());
    };

    let Some(asset) = data_port.find_asset_by_symbol(&benchmark.symbol)? else {
        tracing::warn!(symbol = %benchmark.symbol, "no asset backs benchmark");
        return Ok(ReturnSeries::empty());
    };

    let prices = data_port.get_prices(asset.id, start_date, end_date)?;
    if prices.is_empty() {
        tracing::warn!(symbol = %benchmark.symbol, "no price data for benchmark");
    }
    Ok(returns(&prices))
}
