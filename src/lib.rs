//! portmix: backtests a weighted mix of portfolios against a benchmark.
//!
//! Hexagonal architecture: computation in [`domain`], port traits in
//! [`ports`], concrete data, config and report implementations in
//! [`adapters`], and command dispatch in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
