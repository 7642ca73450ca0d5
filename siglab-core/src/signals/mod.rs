//! Signal generation: price history in, aligned entry/exit flags out.
//!
//! Signals are portfolio-agnostic. A rule sees only the price series and its
//! own parameters, never cash, positions or sizing. Bars where an indicator is
//! still warming up produce `false` flags; they are never dropped, so a
//! `SignalSeries` always has exactly one entry per price bar.
//!
//! Entry and exit may both be true on the same bar for threshold-style rules.
//! The simulator decides what that means.

pub mod bollinger_breakout;
pub mod catalog;
pub mod config;
pub mod ema_crossover;
pub mod macd_crossover;
pub mod momentum;
pub mod rsi_mean_reversion;

pub use bollinger_breakout::BollingerBreakout;
pub use catalog::{ParamDefault, ParamSpec, StrategyKind};
pub use config::{ParamValue, StrategyConfig};
pub use ema_crossover::EmaCrossover;
pub use macd_crossover::MacdCrossover;
pub use momentum::Momentum;
pub use rsi_mean_reversion::RsiMeanReversion;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PriceSeries;
use crate::validation::ValidationError;

/// Entry and exit flags, index-aligned with the price series they came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalSeries {
    pub entries: Vec<bool>,
    pub exits: Vec<bool>,
}

impl SignalSeries {
    /// All-false series of length `n`.
    pub fn empty(n: usize) -> Self {
        Self {
            entries: vec![false; n],
            exits: vec![false; n],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry and exit vectors have equal length.
    pub fn is_aligned(&self) -> bool {
        self.entries.len() == self.exits.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().filter(|&&e| e).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exits.iter().filter(|&&e| e).count()
    }
}

/// A concrete signal rule.
///
/// # Architecture invariant
/// `generate` receives only prices. The flag at bar t may depend only on
/// `prices[..=t]`.
pub trait SignalRule: Send + Sync {
    /// Canonical type name (e.g., "ema_crossover").
    fn name(&self) -> &'static str;

    /// Number of leading bars whose flags are always false.
    fn warmup_bars(&self) -> usize;

    /// Compute entry/exit flags for the whole series.
    fn generate(&self, prices: &[f64]) -> SignalSeries;
}

/// A validated strategy: one variant per rule, each with typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    EmaCrossover(EmaCrossover),
    RsiMeanReversion(RsiMeanReversion),
    BollingerBreakout(BollingerBreakout),
    MacdCrossover(MacdCrossover),
    Momentum(Momentum),
}

impl Strategy {
    /// Validate a raw config and build the typed strategy.
    ///
    /// The config must carry exactly the variant's parameter keys.
    pub fn from_config(config: &StrategyConfig) -> Result<Self, ValidationError> {
        let kind = StrategyKind::from_name(&config.strategy_type)
            .ok_or_else(|| ValidationError::UnknownStrategy(config.strategy_type.clone()))?;
        let keys = kind.param_names();
        let reader = config.reader(kind.name(), &keys)?;

        let strategy = match kind {
            StrategyKind::EmaCrossover => {
                Strategy::EmaCrossover(EmaCrossover::from_params(&reader)?)
            }
            StrategyKind::RsiMeanReversion => {
                Strategy::RsiMeanReversion(RsiMeanReversion::from_params(&reader)?)
            }
            StrategyKind::BollingerBreakout => {
                Strategy::BollingerBreakout(BollingerBreakout::from_params(&reader)?)
            }
            StrategyKind::MacdCrossover => {
                Strategy::MacdCrossover(MacdCrossover::from_params(&reader)?)
            }
            StrategyKind::Momentum => Strategy::Momentum(Momentum::from_params(&reader)?),
        };
        Ok(strategy)
    }

    /// Inverse of `from_config`.
    pub fn to_config(&self) -> StrategyConfig {
        let config = StrategyConfig::new(self.kind().name());
        match self {
            Strategy::EmaCrossover(s) => config
                .with_param("fast_window", s.fast_window)
                .with_param("slow_window", s.slow_window),
            Strategy::RsiMeanReversion(s) => config
                .with_param("rsi_window", s.rsi_window)
                .with_param("oversold", s.oversold)
                .with_param("overbought", s.overbought),
            Strategy::BollingerBreakout(s) => config
                .with_param("window", s.window)
                .with_param("alpha", s.alpha)
                .with_param("band_type", s.band_type.as_str()),
            Strategy::MacdCrossover(s) => config
                .with_param("fast_window", s.fast_window)
                .with_param("slow_window", s.slow_window)
                .with_param("signal_window", s.signal_window),
            Strategy::Momentum(s) => config.with_param("num_days", s.num_days),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::EmaCrossover(_) => StrategyKind::EmaCrossover,
            Strategy::RsiMeanReversion(_) => StrategyKind::RsiMeanReversion,
            Strategy::BollingerBreakout(_) => StrategyKind::BollingerBreakout,
            Strategy::MacdCrossover(_) => StrategyKind::MacdCrossover,
            Strategy::Momentum(_) => StrategyKind::Momentum,
        }
    }

    pub fn rule(&self) -> &dyn SignalRule {
        match self {
            Strategy::EmaCrossover(s) => s,
            Strategy::RsiMeanReversion(s) => s,
            Strategy::BollingerBreakout(s) => s,
            Strategy::MacdCrossover(s) => s,
            Strategy::Momentum(s) => s,
        }
    }

    pub fn warmup_bars(&self) -> usize {
        self.rule().warmup_bars()
    }

    /// Short description including parameters, e.g. `ema_crossover(10, 20)`.
    pub fn describe(&self) -> String {
        match self {
            Strategy::EmaCrossover(s) => {
                format!("ema_crossover({}, {})", s.fast_window, s.slow_window)
            }
            Strategy::RsiMeanReversion(s) => format!(
                "rsi_mean_reversion({}, {}, {})",
                s.rsi_window, s.oversold, s.overbought
            ),
            Strategy::BollingerBreakout(s) => format!(
                "bollinger_breakout({}, {}, {})",
                s.window, s.alpha, s.band_type
            ),
            Strategy::MacdCrossover(s) => format!(
                "macd_crossover({}, {}, {})",
                s.fast_window, s.slow_window, s.signal_window
            ),
            Strategy::Momentum(s) => format!("momentum({})", s.num_days),
        }
    }
}

/// Run a strategy over a price series.
pub fn generate_signals(strategy: &Strategy, prices: &PriceSeries) -> SignalSeries {
    let signals = strategy.rule().generate(&prices.prices());
    debug!(
        strategy = %strategy.describe(),
        symbol = prices.symbol(),
        bars = signals.len(),
        entries = signals.entry_count(),
        exits = signals.exit_count(),
        "generated signals"
    );
    signals
}

/// `a > b` where NaN on either side is false.
pub(crate) fn gt(a: f64, b: f64) -> bool {
    a > b
}

/// `a < b` where NaN on either side is false.
pub(crate) fn lt(a: f64, b: f64) -> bool {
    a < b
}
