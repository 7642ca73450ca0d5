//! CSV file provider: `{dir}/{SYMBOL}.csv` with `date,close` columns.
//!
//! `Date,Close` headers are accepted as aliases; extra columns are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::provider::{build_series, DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{PricePoint, PriceSeries};

#[derive(Debug, Deserialize, Serialize)]
struct PriceRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Close")]
    close: Option<f64>,
}

/// Reads price files from a directory.
#[derive(Debug, Clone)]
pub struct CsvFileProvider {
    dir: PathBuf,
}

impl CsvFileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Read every row of a price file, unfiltered.
    pub fn read_points(path: &Path) -> Result<Vec<PricePoint>, DataError> {
        let csv_err = |reason: String| DataError::CsvError {
            path: path.display().to_string(),
            reason,
        };
        let mut reader = csv::Reader::from_path(path).map_err(|e| csv_err(e.to_string()))?;
        let mut points = Vec::new();
        for row in reader.deserialize::<PriceRow>() {
            let row = row.map_err(|e| csv_err(e.to_string()))?;
            if let Some(close) = row.close {
                points.push(PricePoint::new(row.date, close));
            }
        }
        Ok(points)
    }
}

impl DataProvider for CsvFileProvider {
    fn name(&self) -> &str {
        "csv_file"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::unavailable(
                symbol,
                start,
                end,
                format!("file {} not found", path.display()),
            ));
        }
        let points = Self::read_points(&path)?;
        Ok(FetchResult {
            series: build_series(symbol, points, start, end)?,
            source: DataSource::CsvFile,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

/// Write a series as `date,close` CSV, creating parent directories.
pub fn write_price_csv(path: &Path, series: &PriceSeries) -> Result<(), DataError> {
    let csv_err = |reason: String| DataError::CsvError {
        path: path.display().to_string(),
        reason,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| csv_err(e.to_string()))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_err(e.to_string()))?;
    for point in series.points() {
        writer
            .serialize(PriceRow {
                date: point.date,
                close: Some(point.price),
            })
            .map_err(|e| csv_err(e.to_string()))?;
    }
    writer.flush().map_err(|e| csv_err(e.to_string()))?;
    Ok(())
}
