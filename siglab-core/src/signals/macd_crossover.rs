//! MACD crossover: long bias while the MACD line is above its signal line.
//!
//! entry[t] = macd[t] > signal[t]
//! exit[t]  = macd[t] < signal[t]

use serde::{Deserialize, Serialize};

use crate::indicators::MacdLines;
use crate::validation::ValidationError;

use super::config::ParamReader;
use super::{gt, lt, SignalRule, SignalSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdCrossover {
    pub fast_window: usize,
    pub slow_window: usize,
    pub signal_window: usize,
}

impl MacdCrossover {
    pub(crate) fn from_params(reader: &ParamReader<'_>) -> Result<Self, ValidationError> {
        let fast_window = reader.window("fast_window", 1)?;
        let slow_window = reader.window("slow_window", 1)?;
        let signal_window = reader.window("signal_window", 1)?;
        if fast_window >= slow_window {
            return Err(reader.reject(
                "fast_window",
                format!("must be < slow_window ({fast_window} >= {slow_window})"),
            ));
        }
        Ok(Self {
            fast_window,
            slow_window,
            signal_window,
        })
    }
}

impl SignalRule for MacdCrossover {
    fn name(&self) -> &'static str {
        "macd_crossover"
    }

    fn warmup_bars(&self) -> usize {
        self.slow_window + self.signal_window - 2
    }

    fn generate(&self, prices: &[f64]) -> SignalSeries {
        let lines = MacdLines::compute(
            prices,
            self.fast_window,
            self.slow_window,
            self.signal_window,
        );

        SignalSeries {
            entries: lines
                .line
                .iter()
                .zip(&lines.signal)
                .map(|(&m, &s)| gt(m, s))
                .collect(),
            exits: lines
                .line
                .iter()
                .zip(&lines.signal)
                .map(|(&m, &s)| lt(m, s))
                .collect(),
        }
    }
}
