//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * price[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA at the first defined input equals that input (no SMA seed).
//! Values before `period` defined inputs have been seen are masked to NaN.
//! Lookback: period - 1.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, prices: &[f64]) -> Vec<f64> {
        ema_of_series(prices, self.period)
    }
}

/// EMA of an arbitrary series, which may start with NaN (e.g. a MACD line).
///
/// The recursion starts at the first non-NaN value; output stays NaN until
/// `period` defined values have been consumed. A NaN after the start taints the
/// rest of the output.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };
    let first_valid = start + period - 1;
    if first_valid >= n {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = values[start];
    if start >= first_valid {
        result[start] = prev;
    }

    for i in (start + 1)..n {
        if values[i].is_nan() {
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        if i >= first_valid {
            result[i] = ema;
        }
        prev = ema;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_price() {
        let result = Ema::new(1).compute(&[100.0, 200.0, 300.0]);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // Prices: 10, 11, 12, 13, 14
        // alpha = 2/(3+1) = 0.5, seed EMA[0] = 10
        // EMA[1] = 10.5, EMA[2] = 11.25 (first unmasked), EMA[3] = 12.125, EMA[4] = 13.0625
        let result = Ema::new(3).compute(&[10.0, 11.0, 12.0, 13.0, 14.0]);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.25, DEFAULT_EPSILON);
        assert_approx(result[3], 12.125, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0625, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_too_few_values_is_all_nan() {
        let result = Ema::new(5).compute(&[1.0, 2.0, 3.0]);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_of_series_skips_leading_nan() {
        let values = [f64::NAN, f64::NAN, 4.0, 6.0, 8.0];
        // start = 2, period 2 → first valid at 3; alpha = 2/3
        // EMA[3] = 2/3*6 + 1/3*4 = 5.3333.., EMA[4] = 2/3*8 + 1/3*5.333.. = 7.1111..
        let result = ema_of_series(&values, 2);
        assert!(result[2].is_nan());
        assert_approx(result[3], 16.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_nan_after_seed_propagates() {
        let values = [10.0, 11.0, 12.0, f64::NAN, 14.0];
        let result = ema_of_series(&values, 2);
        assert!(!result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
    }

    #[test]
    fn ema_lookback() {
        assert_eq!(Ema::new(20).lookback(), 19);
        assert_eq!(Ema::new(1).lookback(), 0);
    }
}
