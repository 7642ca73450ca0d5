//! TOML run configuration.
//!
//! ```toml
//! [backtest]
//! symbol = "AAPL"
//! start_date = "2015-01-02"
//! end_date = "2024-12-31"
//! initial_cash = 25000.0
//! size = 10.0
//! size_type = "Percent"
//! fees_pct = 0.10
//! direction = "LongOnly"
//!
//! [strategy]
//! type = "ema_crossover"
//!
//! [strategy.params]
//! fast_window = 10
//! slow_window = 20
//! ```
//!
//! A batch file has the same `[backtest]` table followed by one
//! `[[strategies]]` entry per run.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::engine::{DirectionPolicy, SimulationConfig};
use siglab_core::signals::{Strategy, StrategyConfig};
use siglab_core::sizers::{resolve_sizing, SizeType};
use siglab_core::ValidationError;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("start_date {start} is after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("batch file lists no strategies")]
    EmptyBatch,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    /// Offending parameter name, when the error is about one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ConfigError::Validation(e) => e.parameter(),
            ConfigError::InvalidDateRange { .. } => Some("start_date"),
            _ => None,
        }
    }
}

fn default_initial_cash() -> f64 {
    25_000.0
}

fn default_size() -> f64 {
    10.0
}

fn default_size_type() -> SizeType {
    SizeType::Percent
}

fn default_fees_pct() -> f64 {
    0.10
}

/// Everything about a run except the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default = "default_size_type")]
    pub size_type: SizeType,
    /// Fee per fill in percent of notional (0.10 means 0.1%).
    #[serde(default = "default_fees_pct")]
    pub fees_pct: f64,
    #[serde(default)]
    pub direction: DirectionPolicy,
}

impl BacktestSection {
    /// Resolve sizing and fees into a simulator config.
    pub fn simulation_config(&self) -> Result<SimulationConfig, ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if !self.fees_pct.is_finite() || !(0.0..100.0).contains(&self.fees_pct) {
            return Err(ValidationError::InvalidSetting {
                param: "fees_pct".into(),
                reason: format!("must be within [0, 100), got {}", self.fees_pct),
            }
            .into());
        }
        let sizing = resolve_sizing(self.size, self.size_type)?;
        Ok(SimulationConfig::new(
            self.initial_cash,
            self.fees_pct / 100.0,
            self.direction,
            sizing,
        )?)
    }
}

/// Serializable configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategyConfig,
}

impl BacktestConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read_file(path)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Validate everything the run needs, before any data is touched.
    pub fn validate(&self) -> Result<(Strategy, SimulationConfig), ConfigError> {
        let strategy = Strategy::from_config(&self.strategy)?;
        let simulation = self.backtest.simulation_config()?;
        Ok((strategy, simulation))
    }

    /// Deterministic hash over the canonical JSON form of this config.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Several strategies over one symbol and date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub backtest: BacktestSection,
    pub strategies: Vec<StrategyConfig>,
}

impl BatchConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let batch: Self = toml::from_str(s)?;
        if batch.strategies.is_empty() {
            return Err(ConfigError::EmptyBatch);
        }
        Ok(batch)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read_file(path)?)
    }

    /// One run config per listed strategy, in file order.
    pub fn runs(&self) -> Vec<BacktestConfig> {
        self.strategies
            .iter()
            .map(|strategy| BacktestConfig {
                backtest: self.backtest.clone(),
                strategy: strategy.clone(),
            })
            .collect()
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}
