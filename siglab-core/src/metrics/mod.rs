//! Performance analysis: equity curve + trade ledger → drawdown curve + stats.
//!
//! Every metric is a pure function. Quantities that are undefined for a given
//! run (win rate with no trades, Sharpe on a flat curve) are `None`, never NaN
//! and never an error.

pub mod drawdown;
pub mod ratios;
pub mod trades;

pub use drawdown::{drawdown_curve, max_drawdown, max_drawdown_duration_days};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DrawdownPoint, EquityPoint, PriceSeries, TradeRecord};

/// Summary statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    // ── Period ──
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Calendar days from the first to the last bar.
    pub period_days: i64,

    // ── Returns ──
    pub start_value: f64,
    pub end_value: f64,
    pub total_profit: f64,
    pub total_return_pct: f64,
    /// Buy-and-hold return of the underlying over the same bars.
    pub benchmark_return_pct: Option<f64>,
    pub annualized_return_pct: Option<f64>,

    // ── Risk ──
    /// Deepest drawdown, percent (0 or negative).
    pub max_drawdown_pct: f64,
    pub max_drawdown_duration_days: i64,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub calmar_ratio: Option<f64>,

    // ── Trades ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: Option<f64>,
    pub best_trade_pct: Option<f64>,
    pub worst_trade_pct: Option<f64>,
    pub avg_winning_trade_pct: Option<f64>,
    pub avg_losing_trade_pct: Option<f64>,
    pub profit_factor: Option<f64>,
    pub expectancy: Option<f64>,
    pub total_fees: f64,
}

impl PerformanceStats {
    /// Attach the buy-and-hold benchmark for the price series the run used.
    pub fn with_benchmark(mut self, prices: &PriceSeries) -> Self {
        self.benchmark_return_pct = Some(benchmark_return_pct(prices));
        self
    }
}

/// Derive the drawdown curve and summary statistics.
pub fn analyze(
    equity: &[EquityPoint],
    trades: &[TradeRecord],
    initial_cash: f64,
) -> (Vec<DrawdownPoint>, PerformanceStats) {
    let drawdowns = drawdown_curve(equity);
    let values: Vec<f64> = equity.iter().map(|p| p.equity).collect();

    let start_date = equity.first().map(|p| p.date);
    let end_date = equity.last().map(|p| p.date);
    let period_days = match (start_date, end_date) {
        (Some(start), Some(end)) => (end - start).num_days(),
        _ => 0,
    };

    let end_value = values.last().copied().unwrap_or(initial_cash);
    let total_profit = end_value - initial_cash;
    let total_return_pct = if initial_cash != 0.0 {
        total_profit / initial_cash * 100.0
    } else {
        0.0
    };

    let max_dd = max_drawdown(&drawdowns);

    let stats = PerformanceStats {
        start_date,
        end_date,
        period_days,
        start_value: initial_cash,
        end_value,
        total_profit,
        total_return_pct,
        benchmark_return_pct: None,
        annualized_return_pct: ratios::annualized_return(&values).map(|r| r * 100.0),
        max_drawdown_pct: max_dd * 100.0,
        max_drawdown_duration_days: max_drawdown_duration_days(equity),
        sharpe_ratio: ratios::sharpe_ratio(&values),
        sortino_ratio: ratios::sortino_ratio(&values),
        calmar_ratio: ratios::calmar_ratio(&values, max_dd),
        total_trades: trades.len(),
        winning_trades: trades.iter().filter(|t| t.net_pnl > 0.0).count(),
        losing_trades: trades.iter().filter(|t| t.net_pnl < 0.0).count(),
        win_rate_pct: trades::win_rate_pct(trades),
        best_trade_pct: trades::best_trade_pct(trades),
        worst_trade_pct: trades::worst_trade_pct(trades),
        avg_winning_trade_pct: trades::avg_winning_trade_pct(trades),
        avg_losing_trade_pct: trades::avg_losing_trade_pct(trades),
        profit_factor: trades::profit_factor(trades),
        expectancy: trades::expectancy(trades),
        total_fees: trades.iter().map(TradeRecord::fees).sum(),
    };

    (drawdowns, stats)
}

/// Buy-and-hold return from the first to the last price, percent.
pub fn benchmark_return_pct(prices: &PriceSeries) -> f64 {
    (prices.last().price / prices.first().price - 1.0) * 100.0
}
