//! Price-data collaborators.
//!
//! Providers hand the engine a validated `PriceSeries`; nothing downstream
//! performs I/O. The Parquet cache is itself a provider, so callers can layer
//! cache → network → file without special cases.

pub mod cache;
pub mod csv_file;
pub mod provider;
pub mod yahoo;

pub use cache::{CacheMeta, CoverageResult, ParquetCache};
pub use csv_file::{write_price_csv, CsvFileProvider};
pub use provider::{build_series, DataError, DataProvider, DataSource, FetchResult};
pub use yahoo::YahooProvider;
