//! Bollinger Bands breakout (fade): buy below the lower band, sell above the upper.
//!
//! entry[t] = price[t] < lower[t]
//! exit[t]  = price[t] > upper[t]

use serde::{Deserialize, Serialize};

use crate::indicators::{BandType, BollingerBands};
use crate::validation::ValidationError;

use super::config::ParamReader;
use super::{gt, lt, SignalRule, SignalSeries};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBreakout {
    pub window: usize,
    pub alpha: f64,
    pub band_type: BandType,
}

impl BollingerBreakout {
    pub(crate) fn from_params(reader: &ParamReader<'_>) -> Result<Self, ValidationError> {
        let window = reader.window("window", 2)?;
        let alpha = reader.number("alpha")?;
        if alpha <= 0.0 {
            return Err(reader.reject("alpha", format!("must be > 0, got {alpha}")));
        }
        let raw = reader.text("band_type")?;
        let band_type = BandType::parse(raw)
            .ok_or_else(|| reader.reject("band_type", format!("must be SMA or EMA, got '{raw}'")))?;

        Ok(Self {
            window,
            alpha,
            band_type,
        })
    }
}

impl SignalRule for BollingerBreakout {
    fn name(&self) -> &'static str {
        "bollinger_breakout"
    }

    fn warmup_bars(&self) -> usize {
        self.window - 1
    }

    fn generate(&self, prices: &[f64]) -> SignalSeries {
        let bands = BollingerBands::compute(prices, self.window, self.alpha, self.band_type);

        SignalSeries {
            entries: prices
                .iter()
                .zip(&bands.lower)
                .map(|(&p, &lower)| lt(p, lower))
                .collect(),
            exits: prices
                .iter()
                .zip(&bands.upper)
                .map(|(&p, &upper)| gt(p, upper))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::StrategyConfig;

    const KEYS: [&str; 3] = ["window", "alpha", "band_type"];

    #[test]
    fn spike_down_enters_spike_up_exits() {
        let rule = BollingerBreakout {
            window: 5,
            alpha: 1.5,
            band_type: BandType::Sma,
        };
        let mut prices = vec![100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0];
        prices.push(90.0);
        prices.extend([100.0, 101.0, 100.0, 101.0, 100.0]);
        prices.push(112.0);
        let signals = rule.generate(&prices);

        assert!(signals.entries[7]);
        assert!(!signals.exits[7]);
        assert!(signals.exits[13]);
        assert!(!signals.entries[13]);
    }

    #[test]
    fn band_type_is_validated() {
        let config = StrategyConfig::new("bollinger_breakout")
            .with_param("window", 20usize)
            .with_param("alpha", 2.0)
            .with_param("band_type", "WMA");
        let reader = config.reader("bollinger_breakout", &KEYS).unwrap();
        let err = BollingerBreakout::from_params(&reader).unwrap_err();
        assert_eq!(err.parameter(), Some("band_type"));
    }

    #[test]
    fn window_of_one_rejected() {
        let config = StrategyConfig::new("bollinger_breakout")
            .with_param("window", 1usize)
            .with_param("alpha", 2.0)
            .with_param("band_type", "SMA");
        let reader = config.reader("bollinger_breakout", &KEYS).unwrap();
        assert!(BollingerBreakout::from_params(&reader).is_err());
    }

    #[test]
    fn non_positive_alpha_rejected() {
        let config = StrategyConfig::new("bollinger_breakout")
            .with_param("window", 20usize)
            .with_param("alpha", 0.0)
            .with_param("band_type", "EMA");
        let reader = config.reader("bollinger_breakout", &KEYS).unwrap();
        let err = BollingerBreakout::from_params(&reader).unwrap_err();
        assert_eq!(err.parameter(), Some("alpha"));
    }
}
