//! Indicator trait and concrete indicator implementations.
//!
//! Indicators are pure functions: price history in, numeric series out.
//! Each output has the same length as the input; warm-up bars are `f64::NAN`.
//! Signal rules compare indicator values, and every comparison against NaN is
//! false, which is how warm-up bars end up with false entry/exit flags.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod momentum;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::{BandType, Bollinger, BollingerBands};
pub use ema::{ema_of_series, Ema};
pub use macd::{Macd, MacdLines};
pub use momentum::Momentum;
pub use rsi::Rsi;
pub use sma::Sma;
pub use stddev::{ewm_std, rolling_std};

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on prices from bar t+1 or later. Computing on a
/// truncated series must reproduce the overlapping prefix of the full result.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are NaN.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire price series.
    fn compute(&self, prices: &[f64]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
