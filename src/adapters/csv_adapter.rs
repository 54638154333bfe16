//! CSV directory data adapter.
//!
//! A data directory holds one file per table: `assets.csv`, `portfolios.csv`,
//! `mappings.csv`, `benchmarks.csv` and `prices.csv`, each with a header row
//! naming the record fields. A missing file reads as an empty table. All
//! tables are loaded once when the adapter is opened.

use crate::domain::error::PortmixError;
use crate::domain::price::{
    AssetId, AssetRecord, Benchmark, BenchmarkId, CompositionEntry, PortfolioAssetMapping,
    PortfolioId, PortfolioRecord, PriceObservation, PriceRecord,
};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::path::Path;

pub const ASSETS_FILE: &str = "assets.csv";
pub const PORTFOLIOS_FILE: &str = "portfolios.csv";
pub const MAPPINGS_FILE: &str = "mappings.csv";
pub const BENCHMARKS_FILE: &str = "benchmarks.csv";
pub const PRICES_FILE: &str = "prices.csv";

/// Every table a data source carries, fully in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketData {
    pub assets: Vec<AssetRecord>,
    pub portfolios: Vec<PortfolioRecord>,
    pub mappings: Vec<PortfolioAssetMapping>,
    pub benchmarks: Vec<Benchmark>,
    pub prices: Vec<PriceRecord>,
}

pub struct CsvAdapter {
    data: MarketData,
}

impl CsvAdapter {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PortmixError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(PortmixError::Database {
                reason: format!("data directory {} does not exist", dir.display()),
            });
        }

        let data = MarketData {
            assets: read_table(&dir.join(ASSETS_FILE))?,
            portfolios: read_table(&dir.join(PORTFOLIOS_FILE))?,
            mappings: read_table(&dir.join(MAPPINGS_FILE))?,
            benchmarks: read_table(&dir.join(BENCHMARKS_FILE))?,
            prices: read_table(&dir.join(PRICES_FILE))?,
        };
        tracing::info!(
            dir = %dir.display(),
            assets = data.assets.len(),
            portfolios = data.portfolios.len(),
            prices = data.prices.len(),
            "loaded CSV data"
        );
        Ok(Self { data })
    }

    pub fn from_data(data: MarketData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &MarketData {
        &self.data
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PortmixError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "table file absent, reading as empty");
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| PortmixError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: T = result.map_err(|e| PortmixError::Database {
            reason: format!("CSV parse error in {}: {}", path.display(), e),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

impl DataPort for CsvAdapter {
    fn get_portfolio(
        &self,
        portfolio_id: PortfolioId,
    ) -> Result<Option<PortfolioRecord>, PortmixError> {
        Ok(self
            .data
            .portfolios
            .iter()
            .find(|p| p.id == portfolio_id)
            .cloned())
    }

    fn get_composition(
        &self,
        portfolio_id: PortfolioId,
        as_of: NaiveDate,
    ) -> Result<Vec<CompositionEntry>, PortmixError> {
        let mut entries = Vec::new();
        for mapping in self
            .data
            .mappings
            .iter()
            .filter(|m| m.portfolio_id == portfolio_id && m.effective_date <= as_of)
        {
            let Some(asset) = self.data.assets.iter().find(|a| a.id == mapping.asset_id) else {
                tracing::warn!(asset_id = mapping.asset_id, portfolio_id, "mapping refers to unknown asset");
                continue;
            };
            entries.push(CompositionEntry {
                asset_id: asset.id,
                symbol: asset.symbol.clone(),
                weight: mapping.weight,
                effective_date: mapping.effective_date,
            });
        }
        Ok(entries)
    }

    fn get_prices(
        &self,
        asset_id: AssetId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceObservation>, PortmixError> {
        let mut prices: Vec<PriceObservation> = self
            .data
            .prices
            .iter()
            .filter(|p| p.asset_id == asset_id && p.date >= start_date && p.date <= end_date)
            .map(PriceRecord::observation)
            .collect();
        prices.sort_by_key(|p| p.date);
        prices.dedup_by_key(|p| p.date);
        Ok(prices)
    }

    fn get_benchmark(&self, benchmark_id: BenchmarkId) -> Result<Option<Benchmark>, PortmixError> {
        Ok(self
            .data
            .benchmarks
            .iter()
            .find(|b| b.id == benchmark_id)
            .cloned())
    }

    fn find_asset_by_symbol(&self, symbol: &str) -> Result<Option<AssetRecord>, PortmixError> {
        Ok(self.data.assets.iter().find(|a| a.symbol == symbol).cloned())
    }
}
