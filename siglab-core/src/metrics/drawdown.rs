//! Drawdown curve and drawdown statistics.

use crate::domain::{DrawdownPoint, EquityPoint};

/// Fractional decline from the running peak at every bar (0.0 or negative).
///
/// The running peak starts at the first equity value. Bars where the peak is
/// not positive report 0.0.
pub fn drawdown_curve(equity: &[EquityPoint]) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|point| {
            if point.equity > peak {
                peak = point.equity;
            }
            let drawdown = if peak > 0.0 {
                (point.equity - peak) / peak
            } else {
                0.0
            };
            DrawdownPoint {
                date: point.date,
                drawdown,
            }
        })
        .collect()
}

/// Deepest drawdown as a negative fraction (0.0 when equity never falls).
pub fn max_drawdown(curve: &[DrawdownPoint]) -> f64 {
    curve.iter().map(|d| d.drawdown).fold(0.0, f64::min)
}

/// Longest stretch, in calendar days, from a peak until equity gets back to it.
///
/// A drawdown still open at the last bar is measured to that bar.
pub fn max_drawdown_duration_days(equity: &[EquityPoint]) -> i64 {
    let Some(first) = equity.first() else {
        return 0;
    };
    let mut peak = first.equity;
    let mut peak_date = first.date;
    let mut in_drawdown = false;
    let mut longest = 0;

    for point in &equity[1..] {
        if point.equity >= peak {
            if in_drawdown {
                longest = longest.max((point.date - peak_date).num_days());
            }
            peak = point.equity;
            peak_date = point.date;
            in_drawdown = false;
        } else {
            in_drawdown = true;
        }
    }

    if in_drawdown {
        if let Some(last) = equity.last() {
            longest = longest.max((last.date - peak_date).num_days());
        }
    }
    longest
}
