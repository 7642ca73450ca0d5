//! Price loading and data resolution for the runner.
//!
//! Fallback policy for one symbol and date range:
//! 1. If the cache fully covers the range → use it
//! 2. If a provider is available and not offline → fetch and cache
//! 3. If nothing worked and `synthetic` is set → generate a random walk (tagged)
//! 4. Otherwise → fail before any simulation work
//!
//! Synthetic data is a developer-only debug mode. Results produced on it carry
//! `DataSource::Synthetic`.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, warn};

use siglab_core::data::{CoverageResult, DataError, DataProvider, DataSource, ParquetCache};
use siglab_core::domain::{PricePoint, PriceSeries};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "no cached data for '{symbol}' and no network access (use --synthetic for synthetic data)"
    )]
    NoCachedDataOffline { symbol: String },

    #[error("no cached data for '{symbol}' and download failed: {reason}")]
    DownloadFailed { symbol: String, reason: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Never make network requests.
    pub offline: bool,
    /// Generate synthetic prices when real data is unavailable.
    pub synthetic: bool,
    /// Skip the cache and fetch again.
    pub force: bool,
}

/// Loaded prices plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub series: PriceSeries,
    pub source: DataSource,
}

impl LoadedData {
    fn new(series: PriceSeries, source: DataSource) -> Self {
        Self { series, source }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Load the price series for one symbol over `[start, end]`.
pub fn load_prices(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    if start > end {
        return Err(DataError::unavailable(symbol, start, end, "start date is after end date").into());
    }

    // Step 1: cache
    if !opts.force && cache.covers_range(symbol, start, end) == CoverageResult::FullyCovered {
        match cache.fetch(symbol, start, end) {
            Ok(result) => {
                debug!(symbol, bars = result.series.len(), "loaded from cache");
                return Ok(LoadedData::new(result.series, DataSource::Cache));
            }
            Err(e) => debug!(symbol, error = %e, "cache miss"),
        }
    }

    // Step 2: provider
    let mut last_error = None;
    if !opts.offline {
        if let Some(prov) = provider.filter(|p| p.is_available()) {
            match prov.fetch(symbol, start, end) {
                Ok(result) => {
                    if let Err(e) = cache.write_range(&result.series, result.source, start, end) {
                        warn!(symbol, error = %e, "failed to cache fetched prices");
                    }
                    info!(
                        symbol,
                        provider = prov.name(),
                        bars = result.series.len(),
                        "fetched prices"
                    );
                    return Ok(LoadedData::new(result.series, result.source));
                }
                Err(e) => {
                    warn!(symbol, provider = prov.name(), error = %e, "fetch failed");
                    last_error = Some(e);
                }
            }
        }
    }

    // Step 3: synthetic fallback
    if opts.synthetic {
        warn!(symbol, "generating synthetic prices; results will be tagged as synthetic");
        let series = generate_synthetic_series(symbol, start, end)?;
        return Ok(LoadedData::new(series, DataSource::Synthetic));
    }

    // Step 4: fail
    match last_error {
        Some(e @ DataError::DataUnavailable { .. }) => Err(e.into()),
        Some(e) => Err(LoadError::DownloadFailed {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        }),
        None if opts.offline || provider.is_none() => Err(LoadError::NoCachedDataOffline {
            symbol: symbol.to_string(),
        }),
        None => Err(LoadError::DownloadFailed {
            symbol: symbol.to_string(),
            reason: "provider is not available".into(),
        }),
    }
}

/// Deterministic random walk on weekdays, starting at 100.0.
///
/// Seeded from the symbol name, so the same symbol and range always produce
/// the same series.
pub fn generate_synthetic_series(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, DataError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut points = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            price *= 1.0 + daily_return;
            points.push(PricePoint::new(current, price));
        }
        current += chrono::Duration::days(1);
    }

    if points.is_empty() {
        return Err(DataError::unavailable(symbol, start, end, "no weekdays in range"));
    }
    Ok(PriceSeries::new(symbol, points)?)
}
