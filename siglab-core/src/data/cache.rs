//! Parquet price cache with Hive-style partitioning.
//!
//! Layout: `{cache_dir}/symbol={SYMBOL}/{year}.parquet` plus a `meta.json`
//! sidecar per symbol.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity validation on load (schema check, row count > 0)
//! - Corrupt partitions are quarantined as `{file}.quarantined` and skipped

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{PricePoint, PriceSeries};

/// Metadata sidecar for a cached symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    /// `PriceSeries::content_hash` of the cached series.
    pub data_hash: String,
    pub source: DataSource,
    pub cached_at: chrono::NaiveDateTime,
    /// Requested range the cached bars answer for. Bars may start after and
    /// end before it when the range opens or closes on a non-trading day.
    #[serde(default)]
    pub covered_start: Option<NaiveDate>,
    #[serde(default)]
    pub covered_end: Option<NaiveDate>,
}

impl CacheMeta {
    /// The span the cache can answer for without asking a provider.
    pub fn covered_range(&self) -> (NaiveDate, NaiveDate) {
        (
            self.covered_start.unwrap_or(self.start_date).min(self.start_date),
            self.covered_end.unwrap_or(self.end_date).max(self.end_date),
        )
    }
}

/// How well the cache covers a requested date range.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageResult {
    NotCached,
    FullyCovered,
    PartiallyCovered {
        cached_start: NaiveDate,
        cached_end: NaiveDate,
    },
}

/// The Parquet cache.
#[derive(Debug, Clone)]
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("symbol={symbol}"))
    }

    fn year_path(&self, symbol: &str, year: i32) -> PathBuf {
        self.symbol_dir(symbol).join(format!("{year}.parquet"))
    }

    fn meta_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join("meta.json")
    }

    /// Cache a series as the answer for its own first-to-last date span.
    pub fn write(&self, series: &PriceSeries, source: DataSource) -> Result<(), DataError> {
        self.write_range(series, source, series.first().date, series.last().date)
    }

    /// Cache a series fetched for `[start, end]`.
    ///
    /// When the existing cached span touches or overlaps the new range, bars
    /// outside `[start, end]` are kept and the covered span becomes the union.
    /// A disjoint range replaces the cached series, since the gap between the
    /// two spans was never fetched. One Parquet file is written per year.
    pub fn write_range(
        &self,
        series: &PriceSeries,
        source: DataSource,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), DataError> {
        let symbol = series.symbol();
        let sym_dir = self.symbol_dir(symbol);
        let start = start.min(series.first().date);
        let end = end.max(series.last().date);

        let (merged, covered_start, covered_end) = match self.mergeable_existing(symbol, start, end) {
            Some((existing, (old_start, old_end))) => {
                let mut points: Vec<PricePoint> = existing
                    .points()
                    .iter()
                    .filter(|p| p.date < start || p.date > end)
                    .copied()
                    .collect();
                points.extend_from_slice(series.points());
                points.sort_by_key(|p| p.date);
                debug!(symbol, kept = existing.len(), "merging into cached series");
                (
                    PriceSeries::new(symbol, points)?,
                    old_start.min(start),
                    old_end.max(end),
                )
            }
            None => (series.clone(), start, end),
        };

        fs::create_dir_all(&sym_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut by_year: BTreeMap<i32, Vec<PricePoint>> = BTreeMap::new();
        for point in merged.points() {
            by_year.entry(point.date.year()).or_default().push(*point);
        }

        for (year, points) in &by_year {
            let mut df = points_to_dataframe(points)?;
            let path = self.year_path(symbol, *year);
            let tmp_path = path.with_extension("parquet.tmp");

            write_parquet(&mut df, &tmp_path)?;
            fs::rename(&tmp_path, &path).map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                DataError::CacheError(format!("atomic rename failed: {e}"))
            })?;
        }
        self.remove_stale_partitions(symbol, &by_year)?;

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            start_date: merged.first().date,
            end_date: merged.last().date,
            bar_count: merged.len(),
            data_hash: merged.content_hash(),
            source,
            cached_at: chrono::Local::now().naive_local(),
            covered_start: Some(covered_start),
            covered_end: Some(covered_end),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        debug!(symbol, bars = merged.len(), years = by_year.len(), "cached price series");
        Ok(())
    }

    /// Existing series and covered span, if they can be merged with `[start, end]`.
    fn mergeable_existing(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<(PriceSeries, (NaiveDate, NaiveDate))> {
        let (old_start, old_end) = self.get_meta(symbol)?.covered_range();
        let touches = old_start <= end.succ_opt().unwrap_or(end)
            && start <= old_end.succ_opt().unwrap_or(old_end);
        if !touches {
            return None;
        }
        match self.load(symbol) {
            Ok(existing) => Some((existing, (old_start, old_end))),
            Err(e) => {
                debug!(symbol, error = %e, "existing cache unreadable, replacing");
                None
            }
        }
    }

    /// Delete year partitions that are no longer part of the cached series.
    fn remove_stale_partitions(
        &self,
        symbol: &str,
        years: &BTreeMap<i32, Vec<PricePoint>>,
    ) -> Result<(), DataError> {
        let entries = fs::read_dir(self.symbol_dir(symbol))
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("parquet") {
                continue;
            }
            let year = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i32>().ok());
            if year.is_some_and(|y| !years.contains_key(&y)) {
                fs::remove_file(&path)
                    .map_err(|e| DataError::CacheError(format!("remove stale partition: {e}")))?;
            }
        }
        Ok(())
    }

    /// Load the full cached series for a symbol.
    pub fn load(&self, symbol: &str) -> Result<PriceSeries, DataError> {
        let sym_dir = self.symbol_dir(symbol);
        if !sym_dir.exists() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }

        let entries =
            fs::read_dir(&sym_dir).map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        let mut points = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("parquet") {
                continue;
            }

            match load_and_validate_parquet(&path) {
                Ok(year_points) => points.extend(year_points),
                Err(e) => {
                    let quarantine = path.with_extension("parquet.quarantined");
                    warn!(path = %path.display(), error = %e, "quarantining corrupt cache file");
                    let _ = fs::rename(&path, &quarantine);
                }
            }
        }

        if points.is_empty() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }
        points.sort_by_key(|p| p.date);
        Ok(PriceSeries::new(symbol, points)?)
    }

    pub fn get_meta(&self, symbol: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Whether the cache can answer `[start, end]` on its own.
    ///
    /// Weekend days at either edge of the request are ignored: a range that
    /// opens on a Saturday is covered by a cache that starts the Monday after.
    pub fn covers_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> CoverageResult {
        let Some(meta) = self.get_meta(symbol) else {
            return CoverageResult::NotCached;
        };
        let (covered_start, covered_end) = meta.covered_range();
        let (first, last) = weekday_bounds(start, end);
        if covered_start <= first && covered_end >= last {
            CoverageResult::FullyCovered
        } else {
            CoverageResult::PartiallyCovered {
                cached_start: covered_start,
                cached_end: covered_end,
            }
        }
    }
}

impl DataProvider for ParquetCache {
    fn name(&self) -> &str {
        "parquet_cache"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let full = self.load(symbol)?;
        let series = full
            .slice_dates(start, end)
            .ok_or_else(|| DataError::unavailable(symbol, start, end, "no cached bars in range"))?;
        Ok(FetchResult {
            series,
            source: DataSource::Cache,
        })
    }

    fn is_available(&self) -> bool {
        self.cache_dir.is_dir()
    }
}

/// Request edges moved inward past Saturdays and Sundays.
///
/// A weekend-only request keeps its original edges.
fn weekday_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    let is_weekend = |d: NaiveDate| matches!(d.weekday(), Weekday::Sat | Weekday::Sun);
    let mut first = start;
    while is_weekend(first) && first < end {
        first += chrono::Duration::days(1);
    }
    let mut last = end;
    while is_weekend(last) && last > first {
        last -= chrono::Duration::days(1);
    }
    if is_weekend(first) || is_weekend(last) {
        return (start, end);
    }
    (first, last)
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn points_to_dataframe(points: &[PricePoint]) -> Result<DataFrame, DataError> {
    let epoch = epoch();
    let dates: Vec<i32> = points
        .iter()
        .map(|p| (p.date - epoch).num_days() as i32)
        .collect();
    let closes: Vec<f64> = points.iter().map(|p| p.price).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("close".into(), closes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<PricePoint>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::CacheError("empty parquet file".into()));
    }

    let map_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));
    let date_ca = df
        .column("date")
        .map_err(map_err)?
        .date()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
    let close_ca = df
        .column("close")
        .map_err(map_err)?
        .f64()
        .map_err(|e| DataError::ParquetError(format!("close column type: {e}")))?;

    let epoch = epoch();
    let mut points = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
        let close = close_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null close at row {i}")))?;
        points.push(PricePoint::new(
            epoch + chrono::Duration::days(days as i64),
            close,
        ));
    }
    Ok(points)
}
