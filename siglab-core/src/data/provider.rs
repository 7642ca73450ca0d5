//! Data provider trait and structured error types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PricePoint, PriceSeries, PriceSeriesError};

/// Errors from fetching or caching price data.
#[derive(Debug, Error)]
pub enum DataError {
    /// No usable bars for the requested symbol and range.
    #[error("no price data for '{symbol}' between {start} and {end}: {reason}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("no cached data for symbol '{symbol}'; run `siglab download {symbol}` first")]
    NoCachedData { symbol: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("csv error in {path}: {reason}")]
    CsvError { path: String, reason: String },

    #[error("invalid price series: {0}")]
    InvalidSeries(#[from] PriceSeriesError),
}

impl DataError {
    pub fn unavailable(
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        DataError::DataUnavailable {
            symbol: symbol.to_string(),
            start,
            end,
            reason: reason.into(),
        }
    }

    /// True when retrying the same request elsewhere could succeed
    /// (network trouble, missing cache), false for definitive answers.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_)
                | DataError::RateLimited { .. }
                | DataError::NoCachedData { .. }
                | DataError::CacheError(_)
                | DataError::ParquetError(_)
        )
    }
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvFile,
    Cache,
    Synthetic,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::YahooFinance => "yahoo_finance",
            DataSource::CsvFile => "csv_file",
            DataSource::Cache => "cache",
            DataSource::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetched series and its origin.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub series: PriceSeries,
    pub source: DataSource,
}

/// Source of daily closing prices.
///
/// Implementations return bars within `[start, end]` inclusive. An unknown
/// symbol or an empty range is `DataError::DataUnavailable`.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Whether the provider can currently serve requests.
    fn is_available(&self) -> bool {
        true
    }
}

/// Canonicalize raw observations into a `PriceSeries`.
///
/// Keeps bars inside `[start, end]`, drops missing or non-positive prices,
/// sorts by date and keeps the last observation for a repeated date.
pub fn build_series(
    symbol: &str,
    mut points: Vec<PricePoint>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, DataError> {
    if start > end {
        return Err(DataError::unavailable(
            symbol,
            start,
            end,
            "start date is after end date",
        ));
    }
    points.retain(|p| p.date >= start && p.date <= end && p.price.is_finite() && p.price > 0.0);
    points.sort_by_key(|p| p.date);

    let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match deduped.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => deduped.push(point),
        }
    }

    if deduped.is_empty() {
        return Err(DataError::unavailable(symbol, start, end, "no bars in range"));
    }
    Ok(PriceSeries::new(symbol, deduped)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn build_series_filters_sorts_and_dedupes() {
        let points = vec![
            PricePoint::new(d(5), 12.0),
            PricePoint::new(d(1), 10.0),
            PricePoint::new(d(3), f64::NAN),
            PricePoint::new(d(4), 11.0),
            PricePoint::new(d(4), 11.5),
            PricePoint::new(d(20), 99.0),
        ];
        let series = build_series("X", points, d(1), d(10)).unwrap();
        assert_eq!(series.dates(), vec![d(1), d(4), d(5)]);
        assert_eq!(series.prices(), vec![10.0, 11.5, 12.0]);
    }

    #[test]
    fn empty_range_is_unavailable() {
        let points = vec![PricePoint::new(d(1), 10.0)];
        let err = build_series("X", points, d(10), d(20)).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn inverted_range_is_unavailable() {
        let err = build_series("X", vec![], d(20), d(10)).unwrap_err();
        assert!(err.to_string().contains("after end date"));
    }
}
