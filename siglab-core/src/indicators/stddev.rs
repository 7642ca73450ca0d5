//! Standard deviation helpers for band indicators.

/// Rolling population standard deviation (divide by N).
///
/// NaN until `period` values are available; a window containing NaN yields NaN.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        result[i] = variance.sqrt();
    }

    result
}

/// Exponentially-weighted (biased) standard deviation.
///
/// Uses the same alpha, seed and warm-up mask as `ema_of_series`:
/// mean[t] = mean[t-1] + alpha * (x - mean[t-1])
/// var[t]  = (1 - alpha) * (var[t-1] + alpha * (x - mean[t-1])^2)
pub fn ewm_std(values: &[f64], period: usize) -> Vec<f64> {
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
    let mut mean = values[start];
    let mut var = 0.0;
    if start >= first_valid {
        result[start] = 0.0;
    }

    for i in (start + 1)..n {
        let x = values[i];
        if x.is_nan() {
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let diff = x - mean;
        mean += alpha * diff;
        var = (1.0 - alpha) * (var + alpha * diff * diff);
        if i >= first_valid {
            result[i] = var.sqrt();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rolling_std_known_values() {
        // Window [2, 4, 4, 4, 5, 5, 7, 9] has population std 2.0
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = rolling_std(&values, 8);
        assert!(result[6].is_nan());
        assert_approx(result[7], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_std_constant_is_zero() {
        let result = rolling_std(&[5.0; 6], 3);
        assert_approx(result[2], 0.0, DEFAULT_EPSILON);
        assert_approx(result[5], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_std_constant_is_zero() {
        let result = ewm_std(&[5.0; 6], 3);
        assert!(result[1].is_nan());
        assert_approx(result[2], 0.0, DEFAULT_EPSILON);
        assert_approx(result[5], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_std_two_points() {
        // period 2 → alpha 2/3; x = [0, 2]
        // mean0 = 0, var0 = 0; diff = 2, var1 = 1/3 * (2/3 * 4) = 8/9
        let result = ewm_std(&[0.0, 2.0], 2);
        assert_approx(result[1], (8.0_f64 / 9.0).sqrt(), DEFAULT_EPSILON);
    }
}
