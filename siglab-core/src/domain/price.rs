//! PriceSeries — the fundamental market data unit for a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily observation: the bar's date and its (adjusted) close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceSeriesError {
    #[error("price series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("timestamps must be strictly increasing: {date} follows {previous}")]
    NotIncreasing { previous: NaiveDate, date: NaiveDate },

    #[error("invalid price {price} at {date} (must be finite and > 0)")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("'{symbol}': {dates} dates but {prices} prices")]
    LengthMismatch {
        symbol: String,
        dates: usize,
        prices: usize,
    },
}

/// Ordered (date, price) pairs for a single symbol.
///
/// Construction validates the invariants every downstream component relies on:
/// non-empty, strictly increasing dates, finite positive prices. The series is
/// never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, PriceSeriesError> {
        let symbol = symbol.into();
        if points.is_empty() {
            return Err(PriceSeriesError::Empty { symbol });
        }
        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(PriceSeriesError::InvalidPrice {
                    date: point.date,
                    price: point.price,
                });
            }
            if i > 0 && point.date <= points[i - 1].date {
                return Err(PriceSeriesError::NotIncreasing {
                    previous: points[i - 1].date,
                    date: point.date,
                });
            }
        }
        Ok(Self { symbol, points })
    }

    /// Build a series from parallel date and price slices.
    pub fn from_parts(
        symbol: impl Into<String>,
        dates: &[NaiveDate],
        prices: &[f64],
    ) -> Result<Self, PriceSeriesError> {
        if dates.len() != prices.len() {
            return Err(PriceSeriesError::LengthMismatch {
                symbol: symbol.into(),
                dates: dates.len(),
                prices: prices.len(),
            });
        }
        let points = dates
            .iter()
            .zip(prices)
            .map(|(&date, &price)| PricePoint { date, price })
            .collect();
        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Price values in bar order, the input every indicator consumes.
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    /// Restrict to bars within `[start, end]` (inclusive). Returns `None` when
    /// no bar falls inside the range.
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> Option<Self> {
        let points: Vec<PricePoint> = self
            .points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect();
        if points.is_empty() {
            return None;
        }
        Some(Self {
            symbol: self.symbol.clone(),
            points,
        })
    }

    /// BLAKE3 hash over symbol, dates and price bits. Identical series hash
    /// identically across runs and platforms.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for point in &self.points {
            hasher.update(point.date.to_string().as_bytes());
            hasher.update(&point.price.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn valid_series_constructs() {
        let series = PriceSeries::from_parts("SPY", &[d(2), d(3), d(4)], &[100.0, 101.0, 99.5]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(series.first().date, d(2));
        assert_eq!(series.last().price, 99.5);
    }

    #[test]
    fn empty_series_rejected() {
        let err = PriceSeries::new("SPY", vec![]).unwrap_err();
        assert_eq!(err, PriceSeriesError::Empty { symbol: "SPY".into() });
    }

    #[test]
    fn duplicate_date_rejected() {
        let err = PriceSeries::from_parts("SPY", &[d(2), d(2)], &[100.0, 101.0]).unwrap_err();
        assert!(matches!(err, PriceSeriesError::NotIncreasing { date, .. } if date == d(2)));
    }

    #[test]
    fn non_positive_price_rejected() {
        let err = PriceSeries::from_parts("SPY", &[d(2), d(3)], &[100.0, 0.0]).unwrap_err();
        assert!(matches!(err, PriceSeriesError::InvalidPrice { date, .. } if date == d(3)));
    }

    #[test]
    fn nan_price_rejected() {
        let err = PriceSeries::from_parts("SPY", &[d(2)], &[f64::NAN]).unwrap_err();
        assert!(matches!(err, PriceSeriesError::InvalidPrice { .. }));
    }

    #[test]
    fn mismatched_part_lengths_rejected() {
        let err = PriceSeries::from_parts("SPY", &[d(2), d(3), d(4)], &[100.0, 101.0]).unwrap_err();
        assert_eq!(
            err,
            PriceSeriesError::LengthMismatch {
                symbol: "SPY".into(),
                dates: 3,
                prices: 2,
            }
        );
    }

    #[test]
    fn slice_dates_inclusive() {
        let series =
            PriceSeries::from_parts("SPY", &[d(2), d(3), d(4), d(5)], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let sliced = series.slice_dates(d(3), d(4)).unwrap();
        assert_eq!(sliced.prices(), vec![2.0, 3.0]);
        assert!(series.slice_dates(d(10), d(12)).is_none());
    }

    #[test]
    fn content_hash_is_deterministic_and_sensitive() {
        let a = PriceSeries::from_parts("SPY", &[d(2), d(3)], &[100.0, 101.0]).unwrap();
        let b = PriceSeries::from_parts("SPY", &[d(2), d(3)], &[100.0, 101.0]).unwrap();
        let c = PriceSeries::from_parts("SPY", &[d(2), d(3)], &[100.0, 101.5]).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }
}
