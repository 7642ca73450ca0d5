//! siglab runner — backtest orchestration on top of `siglab-core`.
//!
//! This crate provides:
//! - TOML run and batch configuration with run fingerprinting
//! - Price loading with cache/download/synthetic fallback
//! - Single-backtest runner producing stats, curves and the trade ledger
//! - Batch runs over one series, parallel or sequential
//! - JSON, CSV and Markdown report export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use batch::{run_batch, run_batch_config, BatchMode};
pub use config::{BacktestConfig, BacktestSection, BatchConfig, ConfigError, RunId};
pub use data_loader::{generate_synthetic_series, load_prices, LoadError, LoadOptions, LoadedData};
pub use export::{
    generate_batch_summary, generate_report, load_artifacts, save_artifacts, ReportRenderer,
};
pub use runner::{
    run_backtest_from_prices, run_single_backtest, BacktestResult, RunError, SCHEMA_VERSION,
};
