//! Momentum zero-crossing.
//!
//! momentum[t] = price[t] / price[t - num_days] - 1
//! entry[t] = momentum[t] > 0 && momentum[t-1] <= 0
//! exit[t]  = momentum[t] < 0 && momentum[t-1] >= 0
//!
//! Edge-triggered: a flag fires only on the bar where the sign changes. An
//! undefined previous value never triggers.

use serde::{Deserialize, Serialize};

use crate::indicators::{Indicator, Momentum as MomentumIndicator};
use crate::validation::ValidationError;

use super::config::ParamReader;
use super::{SignalRule, SignalSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Momentum {
    pub num_days: usize,
}

impl Momentum {
    pub(crate) fn from_params(reader: &ParamReader<'_>) -> Result<Self, ValidationError> {
        Ok(Self {
            num_days: reader.window("num_days", 1)?,
        })
    }
}

impl SignalRule for Momentum {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn warmup_bars(&self) -> usize {
        self.num_days + 1
    }

    fn generate(&self, prices: &[f64]) -> SignalSeries {
        let momentum = MomentumIndicator::new(self.num_days).compute(prices);
        let n = momentum.len();
        let mut signals = SignalSeries::empty(n);

        for t in 1..n {
            let (prev, cur) = (momentum[t - 1], momentum[t]);
            if prev.is_nan() || cur.is_nan() {
                continue;
            }
            signals.entries[t] = cur > 0.0 && prev <= 0.0;
            signals.exits[t] = cur < 0.0 && prev >= 0.0;
        }

        signals
    }
}
