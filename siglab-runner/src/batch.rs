//! Independent runs over one loaded price series.
//!
//! Each run owns its strategy and simulator state and only reads the shared
//! series, so runs can execute on the rayon pool without coordination.
//! Results come back in input order either way.

use std::sync::atomic::AtomicBool;

use rayon::prelude::*;
use tracing::info;

use siglab_core::data::{DataProvider, DataSource, ParquetCache};
use siglab_core::domain::PriceSeries;

use crate::config::{BacktestConfig, BatchConfig};
use crate::data_loader::{load_prices, LoadOptions};
use crate::runner::{run_backtest_from_prices, BacktestResult, RunError};

/// How batch runs are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    #[default]
    Parallel,
    Sequential,
}

/// Run every config against `prices`.
///
/// A failing config yields an `Err` in its slot; the other runs are
/// unaffected.
pub fn run_batch(
    configs: &[BacktestConfig],
    prices: &PriceSeries,
    data_source: DataSource,
    mode: BatchMode,
    cancel: Option<&AtomicBool>,
) -> Vec<Result<BacktestResult, RunError>> {
    info!(runs = configs.len(), ?mode, symbol = prices.symbol(), "starting batch");

    let run = |config: &BacktestConfig| run_backtest_from_prices(config, prices, data_source, cancel);
    let results: Vec<_> = match mode {
        BatchMode::Parallel => configs.par_iter().map(run).collect(),
        BatchMode::Sequential => configs.iter().map(run).collect(),
    };

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(runs = results.len(), failed, "batch complete");
    results
}

/// Load the batch's prices once, then run every listed strategy.
///
/// Config validation for each strategy happens before loading, so a bad
/// entry fails the whole batch without touching data.
pub fn run_batch_config(
    batch: &BatchConfig,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
    mode: BatchMode,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<Result<BacktestResult, RunError>>, RunError> {
    let runs = batch.runs();
    for config in &runs {
        config.validate()?;
    }

    let bt = &batch.backtest;
    let loaded = load_prices(&bt.symbol, bt.start_date, bt.end_date, cache, provider, opts)?;
    Ok(run_batch(&runs, &loaded.series, loaded.source, mode, cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::generate_synthetic_series;
    use chrono::NaiveDate;
    use siglab_core::signals::StrategyKind;

    fn batch() -> BatchConfig {
        let mut batch = BatchConfig::from_toml(
            r#"
[backtest]
symbol = "BATCH"
start_date = "2022-01-03"
end_date = "2023-12-29"
size = 25
size_type = "Percent"
direction = "Both"

[[strategies]]
type = "ema_crossover"
params = { fast_window = 10, slow_window = 20 }
"#,
        )
        .unwrap();
        batch.strategies = StrategyKind::ALL
            .iter()
            .map(|k| k.default_config())
            .collect();
        batch
    }

    fn prices() -> PriceSeries {
        generate_synthetic_series(
            "BATCH",
            NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn parallel_matches_sequential() {
        let runs = batch().runs();
        let series = prices();

        let par = run_batch(&runs, &series, DataSource::Synthetic, BatchMode::Parallel, None);
        let seq = run_batch(&runs, &series, DataSource::Synthetic, BatchMode::Sequential, None);

        assert_eq!(par.len(), 5);
        for (p, s) in par.iter().zip(&seq) {
            assert_eq!(p.as_ref().unwrap(), s.as_ref().unwrap());
        }
    }

    #[test]
    fn results_keep_input_order() {
        let runs = batch().runs();
        let results = run_batch(&runs, &prices(), DataSource::Synthetic, BatchMode::Parallel, None);
        for (result, kind) in results.iter().zip(StrategyKind::ALL) {
            assert!(result.as_ref().unwrap().strategy.starts_with(kind.name()));
        }
    }

    #[test]
    fn one_bad_config_does_not_sink_the_rest() {
        let mut runs = batch().runs();
        runs[1].backtest.size = -1.0;
        let results = run_batch(&runs, &prices(), DataSource::Synthetic, BatchMode::Parallel, None);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
