//! RSI mean reversion: buy oversold, sell overbought.
//!
//! entry[t] = rsi[t] < oversold
//! exit[t]  = rsi[t] > overbought

use serde::{Deserialize, Serialize};

use crate::indicators::{Indicator, Rsi};
use crate::validation::ValidationError;

use super::config::ParamReader;
use super::{gt, lt, SignalRule, SignalSeries};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiMeanReversion {
    pub rsi_window: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiMeanReversion {
    pub(crate) fn from_params(reader: &ParamReader<'_>) -> Result<Self, ValidationError> {
        let rsi_window = reader.window("rsi_window", 1)?;
        let oversold = reader.number("oversold")?;
        let overbought = reader.number("overbought")?;

        if !(0.0..=100.0).contains(&oversold) {
            return Err(reader.reject("oversold", format!("must be within 0..=100, got {oversold}")));
        }
        if !(0.0..=100.0).contains(&overbought) {
            return Err(reader.reject(
                "overbought",
                format!("must be within 0..=100, got {overbought}"),
            ));
        }
        if oversold >= overbought {
            return Err(reader.reject(
                "oversold",
                format!("must be < overbought ({oversold} >= {overbought})"),
            ));
        }

        Ok(Self {
            rsi_window,
            oversold,
            overbought,
        })
    }
}

impl SignalRule for RsiMeanReversion {
    fn name(&self) -> &'static str {
        "rsi_mean_reversion"
    }

    fn warmup_bars(&self) -> usize {
        self.rsi_window
    }

    fn generate(&self, prices: &[f64]) -> SignalSeries {
        let rsi = Rsi::new(self.rsi_window).compute(prices);

        SignalSeries {
            entries: rsi.iter().map(|&r| lt(r, self.oversold)).collect(),
            exits: rsi.iter().map(|&r| gt(r, self.overbought)).collect(),
        }
    }
}
