//! Moving Average Convergence Divergence (MACD).
//!
//! line   = EMA(fast) - EMA(slow)
//! signal = EMA(signal_period) of the line, seeded at the line's first defined value
//!
//! Lookback: line = slow - 1, signal = slow + signal - 2.

use super::ema::ema_of_series;
use super::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MacdOutput {
    Line,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
    name: String,
}

impl Macd {
    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        Self {
            fast,
            slow,
            signal,
            output: MacdOutput::Line,
            name: format!("macd_line_{fast}_{slow}_{signal}"),
        }
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        Self {
            fast,
            slow,
            signal,
            output: MacdOutput::Signal,
            name: format!("macd_signal_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let line = self.fast.max(self.slow) - 1;
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal => line + self.signal - 1,
        }
    }

    fn compute(&self, prices: &[f64]) -> Vec<f64> {
        let lines = MacdLines::compute(prices, self.fast, self.slow, self.signal);
        match self.output {
            MacdOutput::Line => lines.line,
            MacdOutput::Signal => lines.signal,
        }
    }
}

/// MACD line and its signal line.
#[derive(Debug, Clone)]
pub struct MacdLines {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
}

impl MacdLines {
    pub fn compute(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Self {
        let fast_ema = ema_of_series(prices, fast);
        let slow_ema = ema_of_series(prices, slow);
        let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&line, signal);
        Self { line, signal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn macd_constant_prices_is_zero() {
        let lines = MacdLines::compute(&[100.0; 20], 3, 6, 3);
        assert!(lines.line[4].is_nan());
        assert_approx(lines.line[5], 0.0, DEFAULT_EPSILON);
        assert!(lines.signal[6].is_nan());
        assert_approx(lines.signal[7], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_line_positive_in_uptrend() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let lines = MacdLines::compute(&prices, 3, 8, 4);
        for i in 8..40 {
            assert!(lines.line[i] > 0.0, "bar {i}");
        }
    }

    #[test]
    fn macd_lookbacks() {
        assert_eq!(Macd::line(12, 26, 9).lookback(), 25);
        assert_eq!(Macd::signal(12, 26, 9).lookback(), 33);
    }
}
