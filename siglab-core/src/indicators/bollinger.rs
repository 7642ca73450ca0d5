//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA or EMA of close over `period`
//! - Upper: middle + mult * stddev
//! - Lower: middle - mult * stddev
//!
//! With `BandType::Sma` the deviation is the rolling population stddev; with
//! `BandType::Ema` it is the exponentially-weighted stddev with the EMA's alpha.
//! Lookback: period - 1.

use serde::{Deserialize, Serialize};

use super::ema::ema_of_series;
use super::sma::rolling_mean;
use super::stddev::{ewm_std, rolling_std};
use super::Indicator;

/// Moving-average family used for the middle band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandType {
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "EMA")]
    Ema,
}

impl BandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandType::Sma => "SMA",
            BandType::Ema => "EMA",
        }
    }

    /// Parse the textual form used in run configurations (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SMA" => Some(BandType::Sma),
            "EMA" => Some(BandType::Ema),
            _ => None,
        }
    }
}

impl std::fmt::Display for BandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band_type: BandType,
    band: Band,
    name: String,
}

impl Bollinger {
    fn with_band(period: usize, multiplier: f64, band_type: BandType, band: Band) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        let label = match band {
            Band::Upper => "upper",
            Band::Middle => "middle",
            Band::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band_type,
            band,
            name: format!(
                "bollinger_{label}_{}_{period}_{multiplier}",
                band_type.as_str().to_ascii_lowercase()
            ),
        }
    }

    pub fn upper(period: usize, multiplier: f64, band_type: BandType) -> Self {
        Self::with_band(period, multiplier, band_type, Band::Upper)
    }

    pub fn middle(period: usize, multiplier: f64, band_type: BandType) -> Self {
        Self::with_band(period, multiplier, band_type, Band::Middle)
    }

    pub fn lower(period: usize, multiplier: f64, band_type: BandType) -> Self {
        Self::with_band(period, multiplier, band_type, Band::Lower)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, prices: &[f64]) -> Vec<f64> {
        let bands = BollingerBands::compute(prices, self.period, self.multiplier, self.band_type);
        match self.band {
            Band::Upper => bands.upper,
            Band::Middle => bands.middle,
            Band::Lower => bands.lower,
        }
    }
}

/// All three bands computed in one pass over the inputs.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerBands {
    pub fn compute(prices: &[f64], period: usize, multiplier: f64, band_type: BandType) -> Self {
        let (middle, std) = match band_type {
            BandType::Sma => (rolling_mean(prices, period), rolling_std(prices, period)),
            BandType::Ema => (ema_of_series(prices, period), ewm_std(prices, period)),
        };

        let upper = middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m + multiplier * s)
            .collect();
        let lower = middle
            .iter()
            .zip(&std)
            .map(|(m, s)| m - multiplier * s)
            .collect();

        Self {
            upper,
            middle,
            lower,
        }
    }
}
