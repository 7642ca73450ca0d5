//! EMA crossover: long bias while the fast EMA sits above the slow EMA.
//!
//! entry[t] = fast[t] > slow[t]
//! exit[t]  = fast[t] < slow[t]
//!
//! Level-based, so entry stays true for as long as the fast EMA leads.

use serde::{Deserialize, Serialize};

use crate::indicators::ema_of_series;
use crate::validation::ValidationError;

use super::config::ParamReader;
use super::{gt, lt, SignalRule, SignalSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmaCrossover {
    pub fast_window: usize,
    pub slow_window: usize,
}

impl EmaCrossover {
    pub(crate) fn from_params(reader: &ParamReader<'_>) -> Result<Self, ValidationError> {
        let fast_window = reader.window("fast_window", 1)?;
        let slow_window = reader.window("slow_window", 1)?;
        if fast_window >= slow_window {
            return Err(reader.reject(
                "fast_window",
                format!("must be < slow_window ({fast_window} >= {slow_window})"),
            ));
        }
        Ok(Self {
            fast_window,
            slow_window,
        })
    }
}

impl SignalRule for EmaCrossover {
    fn name(&self) -> &'static str {
        "ema_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.slow_window - 1
    }

    fn generate(&self, prices: &[f64]) -> SignalSeries {
        let fast = ema_of_series(prices, self.fast_window);
        let slow = ema_of_series(prices, self.slow_window);

        SignalSeries {
            entries: fast.iter().zip(&slow).map(|(&f, &s)| gt(f, s)).collect(),
            exits: fast.iter().zip(&slow).map(|(&f, &s)| lt(f, s)).collect(),
        }
    }
}
