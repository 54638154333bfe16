#![allow(dead_code)]

use chrono::NaiveDate;
use portmix::domain::backtest::{BacktestRequest, PortfolioMixEntry};
use portmix::domain::error::PortmixError;
use portmix::domain::price::{
    AssetId, AssetRecord, Benchmark, BenchmarkId, CompositionEntry, PortfolioId, PortfolioRecord,
    PriceObservation,
};
use portmix::domain::rebalance::RebalancePolicy;
use portmix::ports::data_port::DataPort;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::str::FromStr;

#[derive(Default)]
pub struct MockDataPort {
    pub portfolios: HashMap<PortfolioId, PortfolioRecord>,
    pub compositions: HashMap<PortfolioId, Vec<CompositionEntry>>,
    pub assets: Vec<AssetRecord>,
    pub prices: HashMap<AssetId, Vec<PriceObservation>>,
    pub benchmarks: HashMap<BenchmarkId, Benchmark>,
    pub price_errors: HashMap<AssetId, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_portfolio(mut self, id: PortfolioId, name: &str) -> Self {
        self.portfolios.insert(
            id,
            PortfolioRecord {
                id,
                name: name.to_string(),
                category: "Multi-Asset".to_string(),
                portfolio_type: "model".to_string(),
                base_currency: "USD".to_string(),
            },
        );
        self
    }

    /// Adds an asset with `prices` and maps it into `portfolio` at `weight`.
    pub fn with_holding(
        mut self,
        portfolio: PortfolioId,
        asset_id: AssetId,
        symbol: &str,
        weight: &str,
        prices: Vec<PriceObservation>,
    ) -> Self {
        self = self.with_asset(asset_id, symbol, prices);
        self.compositions.entry(portfolio).or_default().push(CompositionEntry {
            asset_id,
            symbol: symbol.to_string(),
            weight: dec(weight),
            effective_date: date("2000-01-01"),
        });
        self
    }

    pub fn with_asset(mut self, asset_id: AssetId, symbol: &str, prices: Vec<PriceObservation>) -> Self {
        self.assets.push(AssetRecord {
            id: asset_id,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            asset_type: "etf".to_string(),
            currency: "USD".to_string(),
        });
        self.prices.insert(asset_id, prices);
        self
    }

    pub fn with_benchmark(mut self, id: BenchmarkId, symbol: &str) -> Self {
        self.benchmarks.insert(
            id,
            Benchmark {
                id,
                name: format!("{symbol} benchmark"),
                symbol: symbol.to_string(),
                currency: "USD".to_string(),
            },
        );
        self
    }

    pub fn with_price_error(mut self, asset_id: AssetId, reason: &str) -> Self {
        self.price_errors.insert(asset_id, reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn get_portfolio(&self, portfolio_id: PortfolioId) -> Result<Option<PortfolioRecord>, PortmixError> {
        Ok(self.portfolios.get(&portfolio_id).cloned())
    }

    fn get_composition(
        &self,
        portfolio_id: PortfolioId,
        as_of: NaiveDate,
    ) -> Result<Vec<CompositionEntry>, PortmixError> {
        Ok(self
            .compositions
            .get(&portfolio_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.effective_date <= as_of)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_prices(
        &self,
        asset_id: AssetId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceObservation>, PortmixError> {
        if let Some(reason) = self.price_errors.get(&asset_id) {
            return Err(PortmixError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .prices
            .get(&asset_id)
            .map(|prices| {
                prices
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_benchmark(&self, benchmark_id: BenchmarkId) -> Result<Option<Benchmark>, PortmixError> {
        Ok(self.benchmarks.get(&benchmark_id).cloned())
    }

    fn find_asset_by_symbol(&self, symbol: &str) -> Result<Option<AssetRecord>, PortmixError> {
        Ok(self.assets.iter().find(|a| a.symbol == symbol).cloned())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Observations on consecutive entries of `dates`.
pub fn prices(dates: &[&str], closes: &[&str]) -> Vec<PriceObservation> {
    dates
        .iter()
        .zip(closes)
        .map(|(d, c)| PriceObservation::new(date(d), dec(c)))
        .collect()
}

pub fn request(mix: &[(PortfolioId, f64)], benchmark_id: BenchmarkId, start: &str, end: &str) -> BacktestRequest {
    BacktestRequest {
        portfolio_mix: mix
            .iter()
            .map(|(id, w)| PortfolioMixEntry {
                portfolio_id: *id,
                weight: *w,
            })
            .collect(),
        benchmark_id,
        start_date: date(start),
        end_date: date(end),
        rebalance_frequency: RebalancePolicy::Never,
    }
}

/// Portfolio 1 holds asset A (+10%/day), portfolio 2 holds asset B
/// (-10%/day), benchmark 1 tracks asset SPY (+1%/day).
pub fn ab_scenario() -> MockDataPort {
    let days = ["2024-01-01", "2024-01-02", "2024-01-03"];
    MockDataPort::new()
        .with_portfolio(1, "Growth")
        .with_portfolio(2, "Defensive")
        .with_holding(1, 101, "A", "1.0", prices(&days, &["100", "110", "121"]))
        .with_holding(2, 102, "B", "1.0", prices(&days, &["100", "90", "81"]))
        .with_asset(103, "SPY", prices(&days, &["100", "101", "102.01"]))
        .with_benchmark(1, "SPY")
}

/// The [`ab_scenario`] data laid out as a CSV data directory.
pub fn ab_csv_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    fs::write(
        p.join("assets.csv"),
        "id,symbol,name,asset_type,currency\n101,A,A,etf,USD\n102,B,B,etf,USD\n103,SPY,SPY,etf,USD\n",
    )
    .unwrap();
    fs::write(
        p.join("portfolios.csv"),
        "id,name,category,portfolio_type,base_currency\n\
         1,Growth,Multi-Asset,model,USD\n\
         2,Defensive,Multi-Asset,model,USD\n",
    )
    .unwrap();
    fs::write(
        p.join("mappings.csv"),
        "portfolio_id,asset_id,weight,effective_date\n1,101,1.0,2000-01-01\n2,102,1.0,2000-01-01\n",
    )
    .unwrap();
    fs::write(p.join("benchmarks.csv"), "id,name,symbol,currency\n1,S&P 500,SPY,USD\n").unwrap();
    fs::write(
        p.join("prices.csv"),
        "asset_id,date,adjusted_close\n\
         101,2024-01-01,100\n101,2024-01-02,110\n101,2024-01-03,121\n\
         102,2024-01-01,100\n102,2024-01-02,90\n102,2024-01-03,81\n\
         103,2024-01-01,100\n103,2024-01-02,101\n103,2024-01-03,102.01\n",
    )
    .unwrap();
    dir
}
