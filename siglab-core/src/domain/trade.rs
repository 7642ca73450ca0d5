//! TradeRecord — a completed round-trip trade.

use super::position::PositionSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A closed position: entry → exit. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub symbol: String,
    pub side: PositionSide,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    // ── Size ──
    pub quantity: f64,

    // ── PnL ──
    /// (exit - entry) * quantity * direction sign, before fees.
    pub gross_pnl: f64,
    pub entry_fee: f64,
    pub exit_fee: f64,
    /// gross_pnl - entry_fee - exit_fee.
    pub net_pnl: f64,

    // ── Duration ──
    pub bars_held: usize,

    /// Closed by end-of-data liquidation rather than an exit signal.
    pub forced_exit: bool,
}

impl TradeRecord {
    /// Entry plus exit fees.
    pub fn fees(&self) -> f64 {
        self.entry_fee + self.exit_fee
    }

    /// Net return as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.quantity == 0.0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.quantity)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            symbol: "SPY".into(),
            side: PositionSide::Long,
            entry_bar: 4,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            entry_price: 100.0,
            exit_bar: 8,
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            exit_price: 110.0,
            quantity: 50.0,
            gross_pnl: 500.0,
            entry_fee: 5.0,
            exit_fee: 5.5,
            net_pnl: 489.5,
            bars_held: 4,
            forced_exit: false,
        }
    }

    #[test]
    fn fees_sum_entry_and_exit() {
        assert!((sample_trade().fees() - 10.5).abs() < 1e-12);
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        let expected = 489.5 / (100.0 * 50.0);
        assert!((trade.return_pct() - expected).abs() < 1e-10);
    }

    #[test]
    fn is_winner() {
        assert!(sample_trade().is_winner());
        let mut loser = sample_trade();
        loser.net_pnl = 0.0;
        assert!(!loser.is_winner());
    }

    #[test]
    fn holding_days_uses_calendar_dates() {
        assert_eq!(sample_trade().holding_days(), 6);
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
