//! The bar loop.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{EquityPoint, Position, PositionSide, PriceSeries, TradeRecord};
use crate::signals::SignalSeries;

use super::config::SimulationConfig;
use super::error::{InsufficientFundsError, SimulationError};

/// Cash tolerance for the affordability check.
const CASH_EPSILON: f64 = 1e-9;

/// Everything a completed run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub symbol: String,
    /// Closed trades in chronological order.
    pub trades: Vec<TradeRecord>,
    /// One point per price bar.
    pub equity_curve: Vec<EquityPoint>,
    /// Cash balance at each bar's close, aligned with `equity_curve`.
    pub cash_curve: Vec<f64>,
    /// Entries skipped because they could not be afforded.
    pub skipped_entries: Vec<InsufficientFundsError>,
    pub initial_cash: f64,
    pub final_cash: f64,
}

impl SimulationOutput {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_cash)
    }

    pub fn total_fees(&self) -> f64 {
        self.trades.iter().map(TradeRecord::fees).sum()
    }
}

/// Mutable per-run state.
struct SimState<'a> {
    symbol: &'a str,
    fee_rate: f64,
    cash: f64,
    position: Option<Position>,
    trades: Vec<TradeRecord>,
    skipped: Vec<InsufficientFundsError>,
}

impl SimState<'_> {
    fn equity(&self, price: f64) -> f64 {
        self.cash
            + self
                .position
                .as_ref()
                .map_or(0.0, |pos| pos.market_value(price))
    }

    fn side(&self) -> Option<PositionSide> {
        self.position.as_ref().map(|p| p.side)
    }

    fn open(
        &mut self,
        side: PositionSide,
        quantity: f64,
        bar_index: usize,
        date: NaiveDate,
        price: f64,
    ) {
        let notional = quantity * price;
        let fee = notional * self.fee_rate;
        match side {
            PositionSide::Long => self.cash -= notional + fee,
            PositionSide::Short => self.cash += notional - fee,
        }
        debug!(
            symbol = self.symbol,
            bar = bar_index,
            %date,
            ?side,
            quantity,
            price,
            fee,
            "open position"
        );
        self.position = Some(Position {
            side,
            quantity,
            entry_bar: bar_index,
            entry_date: date,
            entry_price: price,
            entry_fee: fee,
        });
    }

    fn close(&mut self, bar_index: usize, date: NaiveDate, price: f64, forced: bool) {
        let Some(pos) = self.position.take() else {
            return;
        };
        let notional = pos.quantity * price;
        let exit_fee = notional * self.fee_rate;
        match pos.side {
            PositionSide::Long => self.cash += notional - exit_fee,
            PositionSide::Short => self.cash -= notional + exit_fee,
        }

        let gross_pnl = pos.unrealized_pnl(price);
        let net_pnl = gross_pnl - pos.entry_fee - exit_fee;
        debug!(
            symbol = self.symbol,
            bar = bar_index,
            %date,
            side = ?pos.side,
            quantity = pos.quantity,
            entry_price = pos.entry_price,
            exit_price = price,
            net_pnl,
            forced,
            "close position"
        );

        self.trades.push(TradeRecord {
            symbol: self.symbol.to_string(),
            side: pos.side,
            entry_bar: pos.entry_bar,
            entry_date: pos.entry_date,
            entry_price: pos.entry_price,
            exit_bar: bar_index,
            exit_date: date,
            exit_price: price,
            quantity: pos.quantity,
            gross_pnl,
            entry_fee: pos.entry_fee,
            exit_fee,
            net_pnl,
            bars_held: bar_index - pos.entry_bar,
            forced_exit: forced,
        });
    }
}

/// Run the trade simulator over one price series.
///
/// Signals must be index-aligned with `prices`; any length difference is a
/// fatal `SimulationError::LengthMismatch`. When `cancel` is set, the flag is
/// checked at the top of every bar and a raised flag aborts the run with
/// `SimulationError::Cancelled`.
pub fn simulate(
    prices: &PriceSeries,
    signals: &SignalSeries,
    config: &SimulationConfig,
    cancel: Option<&AtomicBool>,
) -> Result<SimulationOutput, SimulationError> {
    config.validate()?;

    let n = prices.len();
    if signals.entries.len() != n || signals.exits.len() != n {
        return Err(SimulationError::LengthMismatch {
            symbol: prices.symbol().to_string(),
            last_date: prices.last().date,
            prices: n,
            entries: signals.entries.len(),
            exits: signals.exits.len(),
        });
    }

    let policy = config.direction;
    let mut state = SimState {
        symbol: prices.symbol(),
        fee_rate: config.fee_rate,
        cash: config.initial_cash,
        position: None,
        trades: Vec::new(),
        skipped: Vec::new(),
    };
    let mut equity_curve = Vec::with_capacity(n);
    let mut cash_curve = Vec::with_capacity(n);

    for (t, point) in prices.points().iter().enumerate() {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            debug!(symbol = prices.symbol(), bar = t, "simulation cancelled");
            return Err(SimulationError::Cancelled {
                bar_index: t,
                date: point.date,
            });
        }

        let (date, price) = (point.date, point.price);
        let is_last = t + 1 == n;
        let entry = signals.entries[t];
        let exit = signals.exits[t];

        // Exit handling. On a bar with both flags, only the exit side acts.
        if exit && state.side() == Some(policy.exit_closes()) {
            state.close(t, date, price, false);
        }
        if entry && !exit && state.side() == Some(policy.entry_side().opposite()) {
            state.close(t, date, price, false);
        }

        // Entry handling.
        let target = if entry && !exit {
            Some(policy.entry_side())
        } else if exit && !entry {
            policy.exit_opens()
        } else {
            None
        };
        if let (false, Some(side), None) = (is_last, target, state.side()) {
            try_open(&mut state, config, side, t, date, price);
        }

        if is_last {
            state.close(t, date, price, true);
        }

        equity_curve.push(EquityPoint {
            date,
            equity: state.equity(price),
        });
        cash_curve.push(state.cash);
    }

    debug!(
        symbol = prices.symbol(),
        bars = n,
        trades = state.trades.len(),
        skipped = state.skipped.len(),
        final_cash = state.cash,
        "simulation complete"
    );

    Ok(SimulationOutput {
        symbol: prices.symbol().to_string(),
        trades: state.trades,
        equity_curve,
        cash_curve,
        skipped_entries: state.skipped,
        initial_cash: config.initial_cash,
        final_cash: state.cash,
    })
}

/// Size and open a position, or record the entry as unaffordable.
fn try_open(
    state: &mut SimState<'_>,
    config: &SimulationConfig,
    side: PositionSide,
    bar_index: usize,
    date: NaiveDate,
    price: f64,
) {
    let equity = state.equity(price);
    let quantity = config.sizing.quantity(price, equity, config.fee_rate);
    let unit_cost = price * (1.0 + config.fee_rate);
    let required = quantity.max(1.0) * unit_cost;

    if quantity < 1.0 || required - state.cash > CASH_EPSILON {
        let err = InsufficientFundsError {
            date,
            bar_index,
            side,
            quantity,
            required,
            available: state.cash,
        };
        debug!(symbol = state.symbol, bar = bar_index, %err, "entry skipped");
        state.skipped.push(err);
        return;
    }

    state.open(side, quantity, bar_index, date, price);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DirectionPolicy;
    use crate::sizers::SizingInstruction;

    fn series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..prices.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        PriceSeries::from_parts("TEST", &dates, prices).unwrap()
    }

    fn flags(n: usize, on: &[usize]) -> Vec<bool> {
        (0..n).map(|i| on.contains(&i)).collect()
    }

    fn config(direction: DirectionPolicy, sizing: SizingInstruction, fee_rate: f64) -> SimulationConfig {
        SimulationConfig::new(10_000.0, fee_rate, direction, sizing).unwrap()
    }

    #[test]
    fn long_round_trip_with_fees() {
        let prices = series(&[100.0, 110.0, 120.0, 130.0]);
        let signals = SignalSeries {
            entries: flags(4, &[0]),
            exits: flags(4, &[2]),
        };
        let cfg = config(DirectionPolicy::LongOnly, SizingInstruction::Units(10.0), 0.01);
        let out = simulate(&prices, &signals, &cfg, None).unwrap();

        assert_eq!(out.trades.len(), 1);
        let trade = &out.trades[0];
        assert_eq!(trade.entry_bar, 0);
        assert_eq!(trade.exit_bar, 2);
        assert!(!trade.forced_exit);
        assert!((trade.gross_pnl - 200.0).abs() < 1e-9);
        assert!((trade.entry_fee - 10.0).abs() < 1e-9);
        assert!((trade.exit_fee - 12.0).abs() < 1e-9);
        assert!((trade.net_pnl - 178.0).abs() < 1e-9);

        // bar 0: cash 10_000 - 1000 - 10 = 8990, equity 8990 + 1000 = 9990
        assert!((out.equity_curve[0].equity - 9990.0).abs() < 1e-9);
        assert!((out.final_cash - 10_178.0).abs() < 1e-9);
        assert!((out.final_equity() - 10_178.0).abs() < 1e-9);
    }

    #[test]
    fn last_bar_forces_liquidation() {
        let prices = series(&[100.0, 101.0, 102.0, 103.0]);
        let signals = SignalSeries {
            entries: flags(4, &[1]),
            exits: flags(4, &[]),
        };
        let cfg = config(DirectionPolicy::LongOnly, SizingInstruction::Units(5.0), 0.0);
        let out = simulate(&prices, &signals, &cfg, None).unwrap();

        let trade = out.trades.last().unwrap();
        assert!(trade.forced_exit);
        assert_eq!(trade.exit_bar, 3);
        assert_eq!(trade.exit_date, prices.last().date);
        assert!((out.final_cash - out.final_equity()).abs() < 1e-9);
    }

    #[test]
    fn no_entry_on_final_bar() {
        let prices = series(&[100.0, 101.0, 102.0]);
        let signals = SignalSeries {
            entries: flags(3, &[2]),
            exits: flags(3, &[]),
        };
        let cfg = config(DirectionPolicy::LongOnly, SizingInstruction::Units(1.0), 0.0);
        let out = simulate(&prices, &signals, &cfg, None).unwrap();
        assert!(out.trades.is_empty());
        assert!(out.skipped_entries.is_empty());
    }

    #[test]
    fn exit_wins_on_conflicting_bar() {
        let prices = series(&[100.0, 100.0, 100.0, 100.0]);
        let signals = SignalSeries {
            entries: flags(4, &[0, 1]),
            exits: flags(4, &[1]),
        };
        let cfg = config(DirectionPolicy::LongOnly, SizingInstruction::Units(1.0), 0.0);
        let out = simulate(&prices, &signals, &cfg, None).unwrap();
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades[0].exit_bar, 1);
        assert!(!out.trades[0].forced_exit);
    }

    #[test]
    fn conflicting_bar_opens_nothing_when_flat() {
        let prices = series(&[100.0, 100.0, 100.0]);
        let signals = SignalSeries {
            entries: flags(3, &[0]),
            exits: flags(3, &[0]),
        };
        let cfg = config(DirectionPolicy::Both, SizingInstruction::Units(1.0), 0.0);
        let out = simulate(&prices, &signals, &cfg, None).unwrap();
        assert!(out.trades.is_empty());
    }

    #[test]
    fn short_only_profits_from_decline() {
        let prices = series(&[100.0, 90.0, 80.0, 85.0]);
        let signals = SignalSeries {
            entries: flags(4, &[0]),
            exits: flags(4, &[2]),
        };
        let cfg = config(DirectionPolicy::ShortOnly, SizingInstruction::Units(10.0), 0.0);
        let out = simulate(&prices, &signals, &cfg, None).unwrap();

        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades[0].side, PositionSide::Short);
        assert!((out.trades[0].gross_pnl - 200.0).abs() < 1e-9);
        // bar 1 while short: cash 11_000, position -10 * 90
        assert!((out.cash_curve[1] - 11_000.0).abs() < 1e-9);
        assert!((out.equity_curve[1].equity - 10_100.0).abs() < 1e-9);
        assert!((out.final_equity() - 10_200.0).abs() < 1e-9);
    }

    #[test]
    fn both_policy_reverses_within_a_bar() {
        let prices = series(&[100.0, 105.0, 95.0, 100.0, 98.0]);
        let signals = SignalSeries {
            entries: flags(5, &[0, 3]),
            exits: flags(5, &[2]),
        };
        let cfg = config(DirectionPolicy::Both, SizingInstruction::Units(10.0), 0.0);
        let out = simulate(&prices, &signals, &cfg, None).unwrap();

        let sides: Vec<PositionSide> = out.trades.iter().map(|t| t.side).collect();
        assert_eq!(
            sides,
            vec![PositionSide::Long, PositionSide::Short, PositionSide::Long]
        );
        assert_eq!(out.trades[0].exit_bar, 2);
        assert_eq!(out.trades[1].entry_bar, 2);
        assert_eq!(out.trades[1].exit_bar, 3);
        assert_eq!(out.trades[2].entry_bar, 3);
        assert!(out.trades[2].forced_exit);
    }

    #[test]
    fn unaffordable_entry_is_skipped_and_run_continues() {
        let prices = series(&[100.0, 100.0, 100.0, 100.0]);
        let signals = SignalSeries {
            entries: flags(4, &[0]),
            exits: flags(4, &[]),
        };
        let cfg = config(DirectionPolicy::LongOnly, SizingInstruction::Units(200.0), 0.0);
        let out = simulate(&prices, &signals, &cfg, None).unwrap();

        assert!(out.trades.is_empty());
        assert_eq!(out.skipped_entries.len(), 1);
        let err = &out.skipped_entries[0];
        assert_eq!(err.bar_index, 0);
        assert!((err.required - 20_000.0).abs() < 1e-9);
        assert!((err.available - 10_000.0).abs() < 1e-9);
        assert_eq!(out.equity_curve.len(), 4);
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let prices = series(&[100.0, 101.0, 102.0]);
        let signals = SignalSeries {
            entries: flags(2, &[]),
            exits: flags(2, &[]),
        };
        let cfg = config(DirectionPolicy::LongOnly, SizingInstruction::Units(1.0), 0.0);
        let err = simulate(&prices, &signals, &cfg, None).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::LengthMismatch {
                prices: 3,
                entries: 2,
                ..
            }
        ));
    }

    #[test]
    fn raised_cancel_flag_aborts() {
        let prices = series(&[100.0, 101.0, 102.0]);
        let signals = SignalSeries::empty(3);
        let cfg = config(DirectionPolicy::LongOnly, SizingInstruction::Units(1.0), 0.0);
        let cancel = AtomicBool::new(true);
        let err = simulate(&prices, &signals, &cfg, Some(&cancel)).unwrap_err();
        assert_eq!(
            err,
            SimulationError::Cancelled {
                bar_index: 0,
                date: prices.first().date,
            }
        );
    }

    #[test]
    fn percent_sizing_uses_current_equity() {
        let prices = series(&[100.0, 200.0, 200.0, 200.0]);
        let signals = SignalSeries {
            entries: flags(4, &[0, 2]),
            exits: flags(4, &[1]),
        };
        let cfg = config(
            DirectionPolicy::LongOnly,
            SizingInstruction::EquityFraction(0.5),
            0.0,
        );
        let out = simulate(&prices, &signals, &cfg, None).unwrap();

        // First trade: 50 units at 100, sold at 200 → equity 15_000
        assert_eq!(out.trades[0].quantity, 50.0);
        // Second trade: 50% of 15_000 at 200 → 37 units
        assert_eq!(out.trades[1].quantity, 37.0);
    }
}
