//! Strategy catalogue: names, labels, parameter lists and defaults.

use serde::Serialize;

use super::config::{ParamValue, StrategyConfig};

/// Default value for a catalogue parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamDefault {
    Number(f64),
    Text(&'static str),
}

impl ParamDefault {
    pub fn to_value(self) -> ParamValue {
        match self {
            ParamDefault::Number(v) => ParamValue::Number(v),
            ParamDefault::Text(s) => ParamValue::Text(s.to_string()),
        }
    }
}

/// One parameter of a strategy variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub default: ParamDefault,
}

const fn number(name: &'static str, description: &'static str, default: f64) -> ParamSpec {
    ParamSpec {
        name,
        description,
        default: ParamDefault::Number(default),
    }
}

const EMA_PARAMS: &[ParamSpec] = &[
    number("fast_window", "fast EMA window (bars)", 10.0),
    number("slow_window", "slow EMA window (bars)", 20.0),
];

const RSI_PARAMS: &[ParamSpec] = &[
    number("rsi_window", "RSI window (bars)", 14.0),
    number("oversold", "entry when RSI falls below this level", 30.0),
    number("overbought", "exit when RSI rises above this level", 70.0),
];

const BOLLINGER_PARAMS: &[ParamSpec] = &[
    number("window", "band window (bars)", 20.0),
    number("alpha", "band width in standard deviations", 2.0),
    ParamSpec {
        name: "band_type",
        description: "middle band average: SMA or EMA",
        default: ParamDefault::Text("SMA"),
    },
];

const MACD_PARAMS: &[ParamSpec] = &[
    number("fast_window", "fast EMA window (bars)", 12.0),
    number("slow_window", "slow EMA window (bars)", 26.0),
    number("signal_window", "signal line EMA window (bars)", 9.0),
];

const MOMENTUM_PARAMS: &[ParamSpec] = &[number(
    "num_days",
    "lookback for price / price[t - n] - 1",
    20.0,
)];

/// The closed set of strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    EmaCrossover,
    RsiMeanReversion,
    BollingerBreakout,
    MacdCrossover,
    Momentum,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::EmaCrossover,
        StrategyKind::RsiMeanReversion,
        StrategyKind::BollingerBreakout,
        StrategyKind::MacdCrossover,
        StrategyKind::Momentum,
    ];

    /// Canonical type name used in configs.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::EmaCrossover => "ema_crossover",
            StrategyKind::RsiMeanReversion => "rsi_mean_reversion",
            StrategyKind::BollingerBreakout => "bollinger_breakout",
            StrategyKind::MacdCrossover => "macd_crossover",
            StrategyKind::Momentum => "momentum",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::EmaCrossover => "EMA Crossover",
            StrategyKind::RsiMeanReversion => "RSI Mean Reversion",
            StrategyKind::BollingerBreakout => "Bollinger Bands Breakout",
            StrategyKind::MacdCrossover => "MACD Crossover",
            StrategyKind::Momentum => "Momentum",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            StrategyKind::EmaCrossover => "enter while fast EMA > slow EMA, exit while fast < slow",
            StrategyKind::RsiMeanReversion => "enter while RSI < oversold, exit while RSI > overbought",
            StrategyKind::BollingerBreakout => {
                "enter when price closes below the lower band, exit above the upper band"
            }
            StrategyKind::MacdCrossover => "enter while MACD > signal, exit while MACD < signal",
            StrategyKind::Momentum => {
                "enter when momentum crosses above zero, exit when it crosses below"
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn params(&self) -> &'static [ParamSpec] {
        match self {
            StrategyKind::EmaCrossover => EMA_PARAMS,
            StrategyKind::RsiMeanReversion => RSI_PARAMS,
            StrategyKind::BollingerBreakout => BOLLINGER_PARAMS,
            StrategyKind::MacdCrossover => MACD_PARAMS,
            StrategyKind::Momentum => MOMENTUM_PARAMS,
        }
    }

    pub fn param_names(&self) -> Vec<&'static str> {
        self.params().iter().map(|p| p.name).collect()
    }

    /// Config populated with every default.
    pub fn default_config(&self) -> StrategyConfig {
        self.params()
            .iter()
            .fold(StrategyConfig::new(self.name()), |config, p| {
                config.with_param(p.name, p.default.to_value())
            })
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(StrategyKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(StrategyKind::from_name("EMA"), None);
    }

    #[test]
    fn defaults_match_dashboard() {
        let config = StrategyKind::EmaCrossover.default_config();
        assert_eq!(config.get("fast_window"), Some(&ParamValue::Number(10.0)));
        assert_eq!(config.get("slow_window"), Some(&ParamValue::Number(20.0)));

        let config = StrategyKind::BollingerBreakout.default_config();
        assert_eq!(config.get("band_type"), Some(&ParamValue::Text("SMA".into())));

        let config = StrategyKind::MacdCrossover.default_config();
        assert_eq!(config.params.len(), 3);
    }
}
