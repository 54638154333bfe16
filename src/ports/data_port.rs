//! Read-only data access port.

use crate::domain::error::PortmixError;
use crate::domain::price::{
    AssetId, AssetRecord, Benchmark, BenchmarkId, CompositionEntry, PortfolioId,
    PortfolioRecord, PriceObservation,
};
use chrono::NaiveDate;

pub trait DataPort {
    fn get_portfolio(&self, portfolio_id: PortfolioId)
    -> Result<Option<PortfolioRecord>, PortmixError>;

    /// Composition entries whose effective date is on or before `as_of`.
    fn get_composition(
        &self,
        portfolio_id: PortfolioId,
        as_of: NaiveDate,
    ) -> Result<Vec<CompositionEntry>, PortmixError>;

    /// Observations in `[start_date, end_date]`, ascending by date.
    fn get_prices(
        &self,
        asset_id: AssetId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceObservation>, PortmixError>;

    fn get_benchmark(&self, benchmark_id: BenchmarkId)
    -> Result<Option<Benchmark>, PortmixError>;

    fn find_asset_by_symbol(&self, symbol: &str) -> Result<Option<AssetRecord>, PortmixError>;
}
