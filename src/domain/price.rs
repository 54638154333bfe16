//! Price observations and the records data access hands to the engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type AssetId = i64;
pub type PortfolioId = i64;
pub type BenchmarkId = i64;

/// One adjusted close for one asset on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub adjusted_close: Decimal,
}

impl PriceObservation {
    pub fn new(date: NaiveDate, adjusted_close: Decimal) -> Self {
        Self {
            date,
            adjusted_close,
        }
    }
}

/// One asset's weight inside a portfolio, effective from `effective_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionEntry {
    pub asset_id: AssetId,
    pub symbol: String,
    pub weight: Decimal,
    pub effective_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRecord {
    pub id: PortfolioId,
    pub name: String,
    pub category: String,
    pub portfolio_type: String,
    pub base_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub symbol: String,
    pub name: String,
    pub asset_type: String,
    pub currency: String,
}

/// A benchmark is backed by the asset whose symbol matches `symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub id: BenchmarkId,
    pub name: String,
    pub symbol: String,
    pub currency: String,
}

/// Membership row: `asset_id` held by `portfolio_id` at `weight` from
/// `effective_date` on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAssetMapping {
    pub portfolio_id: PortfolioId,
    pub asset_id: AssetId,
    #[serde(with = "rust_decimal::serde::str")]
    pub weight: Decimal,
    pub effective_date: NaiveDate,
}

/// Stored price row for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub asset_id: AssetId,
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub adjusted_close: Decimal,
}

impl PriceRecord {
    pub fn observation(&self) -> PriceObservation {
        PriceObservation::new(self.date, self.adjusted_close)
    }
}
