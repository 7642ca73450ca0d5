//! Trade-ledger statistics.

use crate::domain::TradeRecord;

/// Percentage of trades with positive net P&L; `None` with no trades.
pub fn win_rate_pct(trades: &[TradeRecord]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    Some(winners as f64 / trades.len() as f64 * 100.0)
}

/// Gross profit / gross loss over net P&L. `None` when nothing was lost.
pub fn profit_factor(trades: &[TradeRecord]) -> Option<f64> {
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| -t.net_pnl)
        .sum();
    if gross_loss <= 0.0 {
        return None;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    Some(gross_profit / gross_loss)
}

/// Mean net P&L per trade in currency.
pub fn expectancy(trades: &[TradeRecord]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    Some(trades.iter().map(|t| t.net_pnl).sum::<f64>() / trades.len() as f64)
}

/// Best single-trade return, percent of entry notional.
pub fn best_trade_pct(trades: &[TradeRecord]) -> Option<f64> {
    trades
        .iter()
        .map(|t| t.return_pct() * 100.0)
        .reduce(f64::max)
}

pub fn worst_trade_pct(trades: &[TradeRecord]) -> Option<f64> {
    trades
        .iter()
        .map(|t| t.return_pct() * 100.0)
        .reduce(f64::min)
}

/// Average return of winners, percent.
pub fn avg_winning_trade_pct(trades: &[TradeRecord]) -> Option<f64> {
    average_pct(trades.iter().filter(|t| t.net_pnl > 0.0))
}

/// Average return of losers, percent.
pub fn avg_losing_trade_pct(trades: &[TradeRecord]) -> Option<f64> {
    average_pct(trades.iter().filter(|t| t.net_pnl < 0.0))
}

fn average_pct<'a>(trades: impl Iterator<Item = &'a TradeRecord>) -> Option<f64> {
    let (sum, count) = trades.fold((0.0, 0usize), |(sum, count), t| {
        (sum + t.return_pct() * 100.0, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}
