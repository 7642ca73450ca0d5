use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Equity (cash + mark-to-market of any open position) at a bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Decline from the running equity peak, as a fraction (0.0 or negative).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub drawdown: f64,
}

impl DrawdownPoint {
    pub fn as_percent(&self) -> f64 {
        self.drawdown * 100.0
    }
}
