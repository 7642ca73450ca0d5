use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of an open position or a closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

/// Open-trade state. Lives only while the simulator is not flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    /// Whole units, always >= 1.
    pub quantity: f64,
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub entry_fee: f64,
}

impl Position {
    /// Signed quantity: positive long, negative short.
    pub fn signed_quantity(&self) -> f64 {
        self.quantity * self.side.sign()
    }

    /// Mark-to-market contribution to equity at `price`.
    pub fn market_value(&self, price: f64) -> f64 {
        self.signed_quantity() * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.signed_quantity()
    }
}
