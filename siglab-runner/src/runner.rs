//! Backtest runner — wires together config, data, engine and analyzer.
//!
//! Two entry points:
//! - `run_single_backtest()`: validates, loads prices, then runs. Used by the CLI.
//! - `run_backtest_from_prices()`: takes an already-loaded series. Used by batch runs.

use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use siglab_core::data::{DataProvider, DataSource, ParquetCache};
use siglab_core::domain::{DrawdownPoint, EquityPoint, PriceSeries, TradeRecord};
use siglab_core::engine::{simulate, InsufficientFundsError, SimulationError};
use siglab_core::metrics::{analyze, PerformanceStats};
use siglab_core::signals::generate_signals;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_prices, LoadError, LoadOptions};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    /// e.g. `ema_crossover(10, 20)`.
    pub strategy: String,
    pub symbol: String,
    pub dataset_hash: String,
    pub data_source: DataSource,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub entry_signals: usize,
    pub exit_signals: usize,
    pub stats: PerformanceStats,
    pub equity_curve: Vec<EquityPoint>,
    pub drawdown_curve: Vec<DrawdownPoint>,
    pub trades: Vec<TradeRecord>,
    /// Entries skipped for lack of cash.
    pub skipped_entries: Vec<InsufficientFundsError>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn is_synthetic(&self) -> bool {
        self.data_source == DataSource::Synthetic
    }
}

/// Validate the config, load its prices, and run.
///
/// Config errors surface before any data is loaded; data errors surface
/// before any simulation work.
pub fn run_single_backtest(
    config: &BacktestConfig,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
    cancel: Option<&AtomicBool>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;

    let bt = &config.backtest;
    let loaded = load_prices(&bt.symbol, bt.start_date, bt.end_date, cache, provider, opts)?;
    run_backtest_from_prices(config, &loaded.series, loaded.source, cancel)
}

/// Run a backtest over pre-loaded prices. Performs no I/O.
pub fn run_backtest_from_prices(
    config: &BacktestConfig,
    prices: &PriceSeries,
    data_source: DataSource,
    cancel: Option<&AtomicBool>,
) -> Result<BacktestResult, RunError> {
    let (strategy, sim_config) = config.validate()?;
    let run_id = config.run_id()?;

    info!(
        run_id = &run_id[..12],
        symbol = prices.symbol(),
        strategy = %strategy.describe(),
        bars = prices.len(),
        source = %data_source,
        "starting backtest"
    );

    let signals = generate_signals(&strategy, prices);
    let output = simulate(prices, &signals, &sim_config, cancel)?;
    let (drawdown_curve, stats) = analyze(&output.equity_curve, &output.trades, output.initial_cash);
    let stats = stats.with_benchmark(prices);

    info!(
        run_id = &run_id[..12],
        trades = output.trades.len(),
        skipped = output.skipped_entries.len(),
        final_equity = output.final_equity(),
        total_return_pct = stats.total_return_pct,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        strategy: strategy.describe(),
        symbol: prices.symbol().to_string(),
        dataset_hash: prices.content_hash(),
        data_source,
        bar_count: prices.len(),
        warmup_bars: strategy.warmup_bars(),
        entry_signals: signals.entry_count(),
        exit_signals: signals.exit_count(),
        stats,
        equity_curve: output.equity_curve,
        drawdown_curve,
        trades: output.trades,
        skipped_entries: output.skipped_entries,
    })
}
