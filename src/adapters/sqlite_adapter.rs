//! SQLite data adapter.
//!
//! Decimal columns are stored as TEXT so prices and weights survive the
//! round trip exactly.

use crate::adapters::csv_adapter::MarketData;
use crate::domain::error::PortmixError;
use crate::domain::price::{
    AssetId, AssetRecord, Benchmark, BenchmarkId, CompositionEntry, PortfolioAssetMapping,
    PortfolioId, PortfolioRecord, PriceObservation, PriceRecord,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row, Transaction};
use rust_decimal::Decimal;
use std::str::FromStr;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY,
    symbol TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    asset_type TEXT NOT NULL,
    currency TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS portfolios (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    portfolio_type TEXT NOT NULL,
    base_currency TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS asset_portfolio_mappings (
    portfolio_id INTEGER NOT NULL REFERENCES portfolios(id),
    asset_id INTEGER NOT NULL REFERENCES assets(id),
    weight TEXT NOT NULL,
    effective_date TEXT NOT NULL,
    PRIMARY KEY (portfolio_id, asset_id, effective_date)
);
CREATE TABLE IF NOT EXISTS historical_prices (
    asset_id INTEGER NOT NULL REFERENCES assets(id),
    date TEXT NOT NULL,
    adjusted_close TEXT NOT NULL,
    PRIMARY KEY (asset_id, date)
);
CREATE TABLE IF NOT EXISTS benchmarks (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    symbol TEXT NOT NULL,
    currency TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_mappings_portfolio ON asset_portfolio_mappings(portfolio_id);
CREATE INDEX IF NOT EXISTS idx_prices_date ON historical_prices(date);
";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PortmixError> {
        let db_path = config.require_string("sqlite", "path")?;
        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;
        Self::open(&db_path, pool_size)
    }

    pub fn open(db_path: &str, pool_size: u32) -> Result<Self, PortmixError> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;
        tracing::debug!(path = db_path, pool_size, "opened SQLite pool");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, PortmixError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, PortmixError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), PortmixError> {
        self.conn()?.execute_batch(SCHEMA).map_err(query_error)
    }

    /// Writes every table of `data` in one transaction, replacing rows with
    /// the same key.
    pub fn import(&self, data: &MarketData) -> Result<(), PortmixError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        insert_assets(&tx, &data.assets)?;
        insert_portfolios(&tx, &data.portfolios)?;
        insert_mappings(&tx, &data.mappings)?;
        insert_benchmarks(&tx, &data.benchmarks)?;
        insert_prices(&tx, &data.prices)?;

        tx.commit().map_err(query_error)?;
        tracing::info!(
            assets = data.assets.len(),
            portfolios = data.portfolios.len(),
            mappings = data.mappings.len(),
            benchmarks = data.benchmarks.len(),
            prices = data.prices.len(),
            "imported market data"
        );
        Ok(())
    }
}

fn pool_error(e: r2d2::Error) -> PortmixError {
    PortmixError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> PortmixError {
    PortmixError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn insert_assets(tx: &Transaction<'_>, assets: &[AssetRecord]) -> Result<(), PortmixError> {
    for a in assets {
        tx.execute(
            "INSERT OR REPLACE INTO assets (id, symbol, name, asset_type, currency)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![a.id, a.symbol, a.name, a.asset_type, a.currency],
        )
        .map_err(query_error)?;
    }
    Ok(())
}

fn insert_portfolios(tx: &Transaction<'_>, portfolios: &[PortfolioRecord]) -> Result<(), PortmixError> {
    for p in portfolios {
        tx.execute(
            "INSERT OR REPLACE INTO portfolios (id, name, category, portfolio_type, base_currency)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![p.id, p.name, p.category, p.portfolio_type, p.base_currency],
        )
        .map_err(query_error)?;
    }
    Ok(())
}

fn insert_mappings(tx: &Transaction<'_>, mappings: &[PortfolioAssetMapping]) -> Result<(), PortmixError> {
    for m in mappings {
        tx.execute(
            "INSERT OR REPLACE INTO asset_portfolio_mappings (portfolio_id, asset_id, weight, effective_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                m.portfolio_id,
                m.asset_id,
                m.weight.to_string(),
                m.effective_date.format(DATE_FORMAT).to_string()
            ],
        )
        .map_err(query_error)?;
    }
    Ok(())
}

fn insert_benchmarks(tx: &Transaction<'_>, benchmarks: &[Benchmark]) -> Result<(), PortmixError> {
    for b in benchmarks {
        tx.execute(
            "INSERT OR REPLACE INTO benchmarks (id, name, symbol, currency)
             VALUES (?1, ?2, ?3, ?4)",
            params![b.id, b.name, b.symbol, b.currency],
        )
        .map_err(query_error)?;
    }
    Ok(())
}

fn insert_prices(tx: &Transaction<'_>, prices: &[PriceRecord]) -> Result<(), PortmixError> {
    let mut stmt = tx
        .prepare(
            "INSERT OR REPLACE INTO historical_prices (asset_id, date, adjusted_close)
             VALUES (?1, ?2, ?3)",
        )
        .map_err(query_error)?;
    for p in prices {
        stmt.execute(params![
            p.asset_id,
            p.date.format(DATE_FORMAT).to_string(),
            p.adjusted_close.to_string()
        ])
        .map_err(query_error)?;
    }
    Ok(())
}

fn text_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.trim().parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl DataPort for SqliteAdapter {
    fn get_portfolio(
        &self,
        portfolio_id: PortfolioId,
    ) -> Result<Option<PortfolioRecord>, PortmixError> {
        self.conn()?
            .query_row(
                "SELECT id, name, category, portfolio_type, base_currency
                 FROM portfolios WHERE id = ?1",
                params![portfolio_id],
                |row| {
                    Ok(PortfolioRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        category: row.get(2)?,
                        portfolio_type: row.get(3)?,
                        base_currency: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(query_error)
    }

    fn get_composition(
        &self,
        portfolio_id: PortfolioId,
        as_of: NaiveDate,
    ) -> Result<Vec<CompositionEntry>, PortmixError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT m.asset_id, a.symbol, m.weight, m.effective_date
                 FROM asset_portfolio_mappings m
                 JOIN assets a ON a.id = m.asset_id
                 WHERE m.portfolio_id = ?1 AND m.effective_date <= ?2
                 ORDER BY m.asset_id, m.effective_date",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![portfolio_id, as_of.format(DATE_FORMAT).to_string()],
                |row| {
                    Ok(CompositionEntry {
                        asset_id: row.get(0)?,
                        symbol: row.get(1)?,
                        weight: text_column::<Decimal>(row, 2)?,
                        effective_date: date_column(row, 3)?,
                    })
                },
            )
            .map_err(query_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    fn get_prices(
        &self,
        asset_id: AssetId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceObservation>, PortmixError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, adjusted_close
                 FROM historical_prices
                 WHERE asset_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![
                    asset_id,
                    start_date.format(DATE_FORMAT).to_string(),
                    end_date.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    Ok(PriceObservation::new(
                        date_column(row, 0)?,
                        text_column::<Decimal>(row, 1)?,
                    ))
                },
            )
            .map_err(query_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    fn get_benchmark(&self, benchmark_id: BenchmarkId) -> Result<Option<Benchmark>, PortmixError> {
        self.conn()?
            .query_row(
                "SELECT id, name, symbol, currency FROM benchmarks WHERE id = ?1",
                params![benchmark_id],
                |row| {
                    Ok(Benchmark {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        symbol: row.get(2)?,
                        currency: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(query_error)
    }

    fn find_asset_by_symbol(&self, symbol: &str) -> Result<Option<AssetRecord>, PortmixError> {
        self.conn()?
            .query_row(
                "SELECT id, symbol, name, asset_type, currency FROM assets WHERE symbol = ?1",
                params![symbol],
                |row| {
                    Ok(AssetRecord {
                        id: row.get(0)?,
                        symbol: row.get(1)?,
                        name: row.get(2)?,
                        asset_type: row.get(3)?,
                        currency: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(query_error)
    }
}
