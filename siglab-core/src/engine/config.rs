//! Simulation parameters: cash, fees, direction policy and sizing.

use serde::{Deserialize, Serialize};

use crate::domain::PositionSide;
use crate::sizers::SizingInstruction;
use crate::validation::ValidationError;

/// Which directions the simulator may trade.
///
/// - `LongOnly`: entry opens Long, exit closes it.
/// - `ShortOnly`: entry opens Short, exit closes it.
/// - `Both`: entry targets Long, exit targets Short. Reaching the other side
///   closes the open position first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DirectionPolicy {
    #[default]
    #[serde(alias = "Long Only", alias = "long_only")]
    LongOnly,
    #[serde(alias = "Short Only", alias = "short_only")]
    ShortOnly,
    #[serde(alias = "both")]
    Both,
}

impl DirectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectionPolicy::LongOnly => "LongOnly",
            DirectionPolicy::ShortOnly => "ShortOnly",
            DirectionPolicy::Both => "Both",
        }
    }

    /// Side an entry flag opens.
    pub fn entry_side(&self) -> PositionSide {
        match self {
            DirectionPolicy::LongOnly | DirectionPolicy::Both => PositionSide::Long,
            DirectionPolicy::ShortOnly => PositionSide::Short,
        }
    }

    /// Side an exit flag closes.
    pub fn exit_closes(&self) -> PositionSide {
        match self {
            DirectionPolicy::LongOnly | DirectionPolicy::Both => PositionSide::Long,
            DirectionPolicy::ShortOnly => PositionSide::Short,
        }
    }

    /// Side an exit flag opens, if any.
    pub fn exit_opens(&self) -> Option<PositionSide> {
        match self {
            DirectionPolicy::Both => Some(PositionSide::Short),
            DirectionPolicy::LongOnly | DirectionPolicy::ShortOnly => None,
        }
    }
}

impl std::str::FromStr for DirectionPolicy {
    type Err = ValidationError;

    /// Accepts "LongOnly", "long only", "long_only", "Both" and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "longonly" => Ok(DirectionPolicy::LongOnly),
            "shortonly" => Ok(DirectionPolicy::ShortOnly),
            "both" => Ok(DirectionPolicy::Both),
            _ => Err(ValidationError::InvalidSetting {
                param: "direction".into(),
                reason: format!("must be LongOnly, ShortOnly or Both, got '{s}'"),
            }),
        }
    }
}

impl std::fmt::Display for DirectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the simulator needs besides prices and signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub initial_cash: f64,
    /// Fee as a fraction of traded notional, charged on entry and on exit.
    pub fee_rate: f64,
    pub direction: DirectionPolicy,
    pub sizing: SizingInstruction,
}

impl SimulationConfig {
    pub fn new(
        initial_cash: f64,
        fee_rate: f64,
        direction: DirectionPolicy,
        sizing: SizingInstruction,
    ) -> Result<Self, ValidationError> {
        let config = Self {
            initial_cash,
            fee_rate,
            direction,
            sizing,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(ValidationError::InvalidSetting {
                param: "initial_cash".into(),
                reason: format!("must be a finite number > 0, got {}", self.initial_cash),
            });
        }
        if !self.fee_rate.is_finite() || !(0.0..1.0).contains(&self.fee_rate) {
            return Err(ValidationError::InvalidSetting {
                param: "fee_rate".into(),
                reason: format!("must be within [0, 1), got {}", self.fee_rate),
            });
        }
        let size = match self.sizing {
            SizingInstruction::Units(v)
            | SizingInstruction::Notional(v)
            | SizingInstruction::EquityFraction(v) => v,
        };
        if !size.is_finite() || size <= 0.0 {
            return Err(ValidationError::InvalidSize { size });
        }
        Ok(())
    }
}
