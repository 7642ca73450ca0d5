//! Return-based risk ratios, annualized over a 365-day calendar year.
//!
//! Each bar counts as one period. Undefined ratios (too few bars, zero
//! volatility, zero drawdown) are `None`.

/// Periods per year for daily bars on a calendar-year basis.
pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Bar-over-bar simple returns.
pub fn period_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0].abs() } else { 0.0 })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Compound annual growth over `equity.len()` daily periods, as a fraction.
pub fn annualized_return(equity: &[f64]) -> Option<f64> {
    let (first, last) = (*equity.first()?, *equity.last()?);
    if equity.len() < 2 || first <= 0.0 || last <= 0.0 {
        return None;
    }
    let years = equity.len() as f64 / PERIODS_PER_YEAR;
    Some((last / first).powf(1.0 / years) - 1.0)
}

/// mean(r) / std(r) * sqrt(365), zero risk-free rate.
pub fn sharpe_ratio(equity: &[f64]) -> Option<f64> {
    let returns = period_returns(equity);
    if returns.len() < 2 {
        return None;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return None;
    }
    Some(mean(&returns) / std * PERIODS_PER_YEAR.sqrt())
}

/// mean(r) / downside_deviation * sqrt(365).
///
/// Downside deviation is sqrt(mean(min(r, 0)^2)) over all periods.
pub fn sortino_ratio(equity: &[f64]) -> Option<f64> {
    let returns = period_returns(equity);
    if returns.len() < 2 {
        return None;
    }
    let downside =
        (returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / returns.len() as f64).sqrt();
    if downside < 1e-15 {
        return None;
    }
    Some(mean(&returns) / downside * PERIODS_PER_YEAR.sqrt())
}

/// Annualized return / |max drawdown|.
pub fn calmar_ratio(equity: &[f64], max_drawdown: f64) -> Option<f64> {
    if max_drawdown >= 0.0 {
        return None;
    }
    annualized_return(equity).map(|r| r / max_drawdown.abs())
}
