//! End-to-end engine tests: strategy → signals → simulator → analyzer.
//!
//! Tests:
//! 1. Conservation: initial cash + net P&L of all trades equals final equity.
//! 2. Every run ends flat, with cash equal to equity on the last bar.
//! 3. Identical inputs produce identical ledgers.
//! 4. Fees reduce the result by exactly what the ledger records.
//! 5. Unaffordable entries are reported, not fatal.

use chrono::NaiveDate;
use siglab_core::domain::PriceSeries;
use siglab_core::engine::{simulate, DirectionPolicy, SimulationConfig, SimulationError};
use siglab_core::metrics::analyze;
use siglab_core::signals::{generate_signals, SignalSeries, Strategy, StrategyKind};
use siglab_core::sizers::{resolve_sizing, SizeType};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
    let dates: Vec<NaiveDate> = (0..n)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let prices: Vec<f64> = (0..n)
        .map(|i| 150.0 + (i as f64 * 0.12).sin() * 20.0 + (i as f64 * 0.031).cos() * 8.0)
        .collect();
    PriceSeries::from_parts("SYN", &dates, &prices).unwrap()
}

fn config(direction: DirectionPolicy, fee_rate: f64) -> SimulationConfig {
    let sizing = resolve_sizing(25.0, SizeType::Percent).unwrap();
    SimulationConfig::new(50_000.0, fee_rate, direction, sizing).unwrap()
}

fn run(kind: StrategyKind, direction: DirectionPolicy, fee_rate: f64) -> siglab_core::engine::SimulationOutput {
    let prices = make_series(400);
    let strategy = Strategy::from_config(&kind.default_config()).unwrap();
    let signals = generate_signals(&strategy, &prices);
    simulate(&prices, &signals, &config(direction, fee_rate), None).unwrap()
}

const POLICIES: [DirectionPolicy; 3] = [
    DirectionPolicy::LongOnly,
    DirectionPolicy::ShortOnly,
    DirectionPolicy::Both,
];

// ── 1. Conservation ──────────────────────────────────────────────────

#[test]
fn realized_pnl_reconciles_with_final_equity() {
    for kind in StrategyKind::ALL {
        for direction in POLICIES {
            let out = run(kind, direction, 0.001);
            let realized: f64 = out.trades.iter().map(|t| t.net_pnl).sum();
            let diff = (out.initial_cash + realized - out.final_equity()).abs();
            assert!(diff < 1e-6, "{kind}/{direction}: off by {diff}");
        }
    }
}

// ── 2. Flat at the end ───────────────────────────────────────────────

#[test]
fn run_ends_flat() {
    for kind in StrategyKind::ALL {
        for direction in POLICIES {
            let out = run(kind, direction, 0.0005);
            assert_eq!(out.equity_curve.len(), 400);
            assert_eq!(out.cash_curve.len(), 400);
            assert!((out.final_cash - out.final_equity()).abs() < 1e-6);
            if let Some(last) = out.trades.last() {
                assert!(last.exit_bar <= 399);
            }
            assert!(out
                .trades
                .iter()
                .filter(|t| t.forced_exit)
                .all(|t| t.exit_bar == 399));
        }
    }
}

#[test]
fn trades_never_overlap() {
    let out = run(StrategyKind::MacdCrossover, DirectionPolicy::Both, 0.0);
    for pair in out.trades.windows(2) {
        assert!(pair[0].exit_bar <= pair[1].entry_bar);
    }
}

// ── 3. Determinism ───────────────────────────────────────────────────

#[test]
fn identical_inputs_identical_outputs() {
    let a = run(StrategyKind::BollingerBreakout, DirectionPolicy::Both, 0.002);
    let b = run(StrategyKind::BollingerBreakout, DirectionPolicy::Both, 0.002);
    assert_eq!(a, b);
}

// ── 4. Fees ──────────────────────────────────────────────────────────

#[test]
fn fees_are_fully_accounted() {
    let prices = make_series(300);
    let strategy = Strategy::from_config(&StrategyKind::EmaCrossover.default_config()).unwrap();
    let signals = generate_signals(&strategy, &prices);
    let sizing = resolve_sizing(100.0, SizeType::Amount).unwrap();

    let free = simulate(
        &prices,
        &signals,
        &SimulationConfig::new(50_000.0, 0.0, DirectionPolicy::LongOnly, sizing).unwrap(),
        None,
    )
    .unwrap();
    let paid = simulate(
        &prices,
        &signals,
        &SimulationConfig::new(50_000.0, 0.01, DirectionPolicy::LongOnly, sizing).unwrap(),
        None,
    )
    .unwrap();

    assert!(!free.trades.is_empty());
    assert_eq!(free.trades.len(), paid.trades.len());
    assert_eq!(free.total_fees(), 0.0);
    assert!(paid.total_fees() > 0.0);
    let diff = free.final_equity() - paid.final_equity() - paid.total_fees();
    assert!(diff.abs() < 1e-6);

    let (_, stats) = analyze(&paid.equity_curve, &paid.trades, paid.initial_cash);
    assert!((stats.total_fees - paid.total_fees()).abs() < 1e-9);
    assert_eq!(stats.total_trades, paid.trades.len());
}

// ── 5. Recoverable vs fatal ──────────────────────────────────────────

#[test]
fn unaffordable_entries_do_not_abort() {
    let prices = make_series(200);
    let strategy = Strategy::from_config(&StrategyKind::EmaCrossover.default_config()).unwrap();
    let signals = generate_signals(&strategy, &prices);
    let sizing = resolve_sizing(1_000_000.0, SizeType::Value).unwrap();
    let cfg = SimulationConfig::new(10_000.0, 0.0, DirectionPolicy::LongOnly, sizing).unwrap();

    let out = simulate(&prices, &signals, &cfg, None).unwrap();
    assert!(out.trades.is_empty());
    assert!(!out.skipped_entries.is_empty());
    assert!(out.equity_curve.iter().all(|p| (p.equity - 10_000.0).abs() < 1e-9));
}

#[test]
fn misaligned_signals_are_fatal() {
    let prices = make_series(50);
    let cfg = config(DirectionPolicy::LongOnly, 0.0);
    let err = simulate(&prices, &SignalSeries::empty(49), &cfg, None).unwrap_err();
    assert!(matches!(err, SimulationError::LengthMismatch { .. }));
    assert!(err.to_string().contains("SYN"));
}

#[test]
fn invalid_config_is_fatal() {
    let prices = make_series(10);
    let mut cfg = config(DirectionPolicy::LongOnly, 0.0);
    cfg.initial_cash = 0.0;
    let err = simulate(&prices, &SignalSeries::empty(10), &cfg, None).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidConfig(_)));
}
