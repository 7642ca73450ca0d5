//! Position sizing: user size + size type → normalized sizing instruction.
//!
//! Resolution is split in two. `resolve_sizing` validates the raw input once,
//! before the run. `SizingInstruction::quantity` turns the instruction into a
//! whole-unit quantity at an entry bar, using that bar's price and equity.

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// How the user-supplied size is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeType {
    /// Literal number of units.
    #[serde(alias = "amount")]
    Amount,
    /// Currency notional per trade.
    #[serde(alias = "value")]
    Value,
    /// Percent of current equity (10 means 10%).
    #[serde(alias = "percent")]
    Percent,
}

impl SizeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeType::Amount => "Amount",
            SizeType::Value => "Value",
            SizeType::Percent => "Percent",
        }
    }
}

impl std::str::FromStr for SizeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "amount" => Ok(SizeType::Amount),
            "value" => Ok(SizeType::Value),
            "percent" => Ok(SizeType::Percent),
            _ => Err(ValidationError::UnknownSizeType(s.to_string())),
        }
    }
}

impl std::fmt::Display for SizeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized sizing instruction consumed by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SizingInstruction {
    /// Fixed unit count.
    Units(f64),
    /// Fixed currency notional.
    Notional(f64),
    /// Fraction of current total equity (0.10 = 10%).
    EquityFraction(f64),
}

/// Validate a raw size and convert it into a `SizingInstruction`.
pub fn resolve_sizing(size: f64, size_type: SizeType) -> Result<SizingInstruction, ValidationError> {
    if !size.is_finite() || size <= 0.0 {
        return Err(ValidationError::InvalidSize { size });
    }
    Ok(match size_type {
        SizeType::Amount => SizingInstruction::Units(size),
        SizeType::Value => SizingInstruction::Notional(size),
        SizeType::Percent => SizingInstruction::EquityFraction(size / 100.0),
    })
}

impl SizingInstruction {
    /// Whole-unit quantity to trade at `price`.
    ///
    /// Equity-fraction sizing reserves room for the entry fee so the full cost
    /// `q * price * (1 + fee_rate)` stays within the requested fraction.
    /// The result may be zero; the caller decides whether that is tradable.
    pub fn quantity(&self, price: f64, equity: f64, fee_rate: f64) -> f64 {
        if price.is_nan() || price <= 0.0 {
            return 0.0;
        }
        let raw = match *self {
            SizingInstruction::Units(n) => n,
            SizingInstruction::Notional(v) => v / price,
            SizingInstruction::EquityFraction(f) => f * equity.max(0.0) / (price * (1.0 + fee_rate)),
        };
        raw.max(0.0).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_divides_by_hundred() {
        assert_eq!(
            resolve_sizing(10.0, SizeType::Percent).unwrap(),
            SizingInstruction::EquityFraction(0.10)
        );
    }

    #[test]
    fn amount_and_value_pass_through() {
        assert_eq!(
            resolve_sizing(7.0, SizeType::Amount).unwrap(),
            SizingInstruction::Units(7.0)
        );
        assert_eq!(
            resolve_sizing(2500.0, SizeType::Value).unwrap(),
            SizingInstruction::Notional(2500.0)
        );
    }

    #[test]
    fn non_positive_or_non_finite_rejected() {
        for size in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(resolve_sizing(size, SizeType::Amount).is_err(), "size {size}");
        }
    }

    #[test]
    fn size_type_parses_case_insensitive() {
        assert_eq!("percent".parse::<SizeType>().unwrap(), SizeType::Percent);
        assert_eq!("Value".parse::<SizeType>().unwrap(), SizeType::Value);
        assert!("shares".parse::<SizeType>().is_err());
    }

    #[test]
    fn quantity_floors_to_whole_units() {
        assert_eq!(SizingInstruction::Units(3.7).quantity(10.0, 1000.0, 0.0), 3.0);
        assert_eq!(SizingInstruction::Notional(1050.0).quantity(100.0, 0.0, 0.0), 10.0);
        // 50% of 10_000 at price 99 with 1% fee: 5000 / 99.99 = 50.005 → 50
        assert_eq!(
            SizingInstruction::EquityFraction(0.5).quantity(99.0, 10_000.0, 0.01),
            50.0
        );
    }

    #[test]
    fn quantity_can_be_zero() {
        assert_eq!(SizingInstruction::Notional(50.0).quantity(100.0, 0.0, 0.0), 0.0);
    }
}
