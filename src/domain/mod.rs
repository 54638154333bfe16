//! Core domain types and computation.

pub mod error;
pub mod price;
pub mod return_series;
pub mod returns;
pub mod rebalance;
pub mod simulator;
pub mod metrics;
pub mod time_series;
pub mod events;
pub mod sanitize;
pub mod backtest;
pub mod request_validation;
pub mod config_validation;
