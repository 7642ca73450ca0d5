//! Rate-of-change momentum: p[t] / p[t-n] - 1.
//!
//! Lookback: n.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Momentum {
    days: usize,
    name: String,
}

impl Momentum {
    pub fn new(days: usize) -> Self {
        assert!(days >= 1, "Momentum lookback must be >= 1");
        Self {
            days,
            name: format!("momentum_{days}"),
        }
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.days
    }

    fn compute(&self, prices: &[f64]) -> Vec<f64> {
        let n = prices.len();
        let mut result = vec![f64::NAN; n];
        for i in self.days..n {
            let base = prices[i - self.days];
            if base != 0.0 {
                result[i] = prices[i] / base - 1.0;
            }
        }
        result
    }
}
