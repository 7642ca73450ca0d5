//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! The four run artifacts (stats, equity curve, drawdown curve, trade list)
//! are rendered through `ReportRenderer`:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade list, and equity + drawdown per bar
//! - **Markdown**: human-readable single-run report and batch comparison
//!
//! Artifacts are a pure function of the result, so identical runs write
//! byte-identical files.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use siglab_core::domain::{DrawdownPoint, EquityPoint, TradeRecord};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

/// Turns a result into one artifact file.
pub trait ReportRenderer {
    /// File name inside the artifact directory.
    fn file_name(&self) -> &'static str;

    fn render(&self, result: &BacktestResult) -> Result<String>;
}

pub struct JsonRenderer;
pub struct TradesCsvRenderer;
pub struct EquityCsvRenderer;
pub struct MarkdownRenderer;

impl ReportRenderer for JsonRenderer {
    fn file_name(&self) -> &'static str {
        "result.json"
    }

    fn render(&self, result: &BacktestResult) -> Result<String> {
        export_json(result)
    }
}

impl ReportRenderer for TradesCsvRenderer {
    fn file_name(&self) -> &'static str {
        "trades.csv"
    }

    fn render(&self, result: &BacktestResult) -> Result<String> {
        export_trades_csv(&result.trades)
    }
}

impl ReportRenderer for EquityCsvRenderer {
    fn file_name(&self) -> &'static str {
        "equity.csv"
    }

    fn render(&self, result: &BacktestResult) -> Result<String> {
        export_equity_csv(&result.equity_curve, &result.drawdown_curve)
    }
}

impl ReportRenderer for MarkdownRenderer {
    fn file_name(&self) -> &'static str {
        "report.md"
    }

    fn render(&self, result: &BacktestResult) -> Result<String> {
        Ok(generate_report(result))
    }
}

/// The built-in renderers, in the order `save_artifacts` writes them.
pub fn default_renderers() -> Vec<Box<dyn ReportRenderer>> {
    vec![
        Box::new(JsonRenderer),
        Box::new(TradesCsvRenderer),
        Box::new(EquityCsvRenderer),
        Box::new(MarkdownRenderer),
    ]
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: symbol, side, entry_bar, entry_date, entry_price, exit_bar,
/// exit_date, exit_price, quantity, gross_pnl, fees, net_pnl, return_pct,
/// bars_held, forced_exit
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "side",
        "entry_bar",
        "entry_date",
        "entry_price",
        "exit_bar",
        "exit_date",
        "exit_price",
        "quantity",
        "gross_pnl",
        "fees",
        "net_pnl",
        "return_pct",
        "bars_held",
        "forced_exit",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.symbol,
            &format!("{:?}", t.side),
            &t.entry_bar.to_string(),
            &t.entry_date.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_bar.to_string(),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.0}", t.quantity),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.fees()),
            &format!("{:.2}", t.net_pnl),
            &format!("{:.4}", t.return_pct() * 100.0),
            &t.bars_held.to_string(),
            &t.forced_exit.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export equity and drawdown per bar: date, equity, drawdown_pct.
pub fn export_equity_csv(equity: &[EquityPoint], drawdown: &[DrawdownPoint]) -> Result<String> {
    if equity.len() != drawdown.len() {
        bail!(
            "equity curve has {} points but drawdown curve has {}",
            equity.len(),
            drawdown.len()
        );
    }
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "drawdown_pct"])?;
    for (eq, dd) in equity.iter().zip(drawdown) {
        wtr.write_record([
            &eq.date.to_string(),
            &format!("{:.2}", eq.equity),
            &format!("{:.4}", dd.as_percent()),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a run: `{symbol}_{first 12 hex chars of run_id}`.
pub fn artifact_dir_name(result: &BacktestResult) -> String {
    let short = result.run_id.get(..12).unwrap_or(&result.run_id);
    format!("{}_{}", result.symbol, short)
}

/// Save the full artifact set for a single backtest run.
///
/// Creates `{symbol}_{run_id}/` under `output_dir` and writes one file per
/// renderer. Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dir_name(result));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    for renderer in default_renderers() {
        let path = run_dir.join(renderer.file_name());
        let content = renderer.render(result)?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join(JsonRenderer.file_name());
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

fn opt(v: Option<f64>, decimals: usize, suffix: &str) -> String {
    match v {
        Some(x) => format!("{x:.decimals$}{suffix}"),
        None => "n/a".to_string(),
    }
}

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);
    let bt = &result.config.backtest;
    let s = &result.stats;

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Strategy | {} |\n", result.strategy));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        opt_date(s.start_date),
        opt_date(s.end_date)
    ));
    md.push_str(&format!("| Initial Cash | {:.2} |\n", bt.initial_cash));
    md.push_str(&format!("| Size | {} ({}) |\n", bt.size, bt.size_type));
    md.push_str(&format!("| Fees | {}% |\n", bt.fees_pct));
    md.push_str(&format!("| Direction | {} |\n", bt.direction));
    md.push_str(&format!(
        "| Bars | {} ({} warmup) |\n",
        result.bar_count, result.warmup_bars
    ));
    md.push_str(&format!(
        "| Signals | {} entry / {} exit |\n",
        result.entry_signals, result.exit_signals
    ));
    md.push_str(&format!("| Data Source | {} |\n", result.data_source));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    if result.is_synthetic() {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Portfolio Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Start Value | {:.2} |\n", s.start_value));
    md.push_str(&format!("| End Value | {:.2} |\n", s.end_value));
    md.push_str(&format!("| Total Profit | {:.2} |\n", s.total_profit));
    md.push_str(&format!("| Total Return | {:.2}% |\n", s.total_return_pct));
    md.push_str(&format!(
        "| Benchmark Return | {} |\n",
        opt(s.benchmark_return_pct, 2, "%")
    ));
    md.push_str(&format!(
        "| Annualized Return | {} |\n",
        opt(s.annualized_return_pct, 2, "%")
    ));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", s.max_drawdown_pct));
    md.push_str(&format!(
        "| Max Drawdown Duration | {} days |\n",
        s.max_drawdown_duration_days
    ));
    md.push_str(&format!("| Sharpe | {} |\n", opt(s.sharpe_ratio, 3, "")));
    md.push_str(&format!("| Sortino | {} |\n", opt(s.sortino_ratio, 3, "")));
    md.push_str(&format!("| Calmar | {} |\n", opt(s.calmar_ratio, 3, "")));
    md.push_str(&format!("| Total Fees | {:.2} |\n", s.total_fees));
    md.push_str(&format!("| Period | {} days |\n", s.period_days));
    md.push('\n');

    md.push_str("## Trades\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Trades | {} ({} won / {} lost) |\n",
        s.total_trades, s.winning_trades, s.losing_trades
    ));
    md.push_str(&format!("| Win Rate | {} |\n", opt(s.win_rate_pct, 1, "%")));
    md.push_str(&format!("| Best Trade | {} |\n", opt(s.best_trade_pct, 2, "%")));
    md.push_str(&format!("| Worst Trade | {} |\n", opt(s.worst_trade_pct, 2, "%")));
    md.push_str(&format!(
        "| Avg Winning Trade | {} |\n",
        opt(s.avg_winning_trade_pct, 2, "%")
    ));
    md.push_str(&format!(
        "| Avg Losing Trade | {} |\n",
        opt(s.avg_losing_trade_pct, 2, "%")
    ));
    md.push_str(&format!("| Profit Factor | {} |\n", opt(s.profit_factor, 2, "")));
    md.push_str(&format!("| Expectancy | {} |\n", opt(s.expectancy, 2, "")));
    if !result.skipped_entries.is_empty() {
        md.push_str(&format!(
            "| Skipped Entries | {} (insufficient funds) |\n",
            result.skipped_entries.len()
        ));
    }
    md.push('\n');

    md
}

fn opt_date(d: Option<chrono::NaiveDate>) -> String {
    d.map_or_else(|| "n/a".to_string(), |d| d.to_string())
}

/// Side-by-side Markdown table for a batch of runs over the same data.
pub fn generate_batch_summary(results: &[BacktestResult]) -> String {
    let mut md = String::with_capacity(1024);
    md.push_str("# Batch Summary\n\n");
    if let Some(first) = results.first() {
        md.push_str(&format!(
            "{} | {} bars | {}\n\n",
            first.symbol, first.bar_count, first.data_source
        ));
    }
    md.push_str("| Strategy | Return | Max DD | Sharpe | Trades | Win Rate | Fees |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for r in results {
        let s = &r.stats;
        md.push_str(&format!(
            "| {} | {:.2}% | {:.2}% | {} | {} | {} | {:.2} |\n",
            r.strategy,
            s.total_return_pct,
            s.max_drawdown_pct,
            opt(s.sharpe_ratio, 3, ""),
            s.total_trades,
            opt(s.win_rate_pct, 1, "%"),
            s.total_fees,
        ));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use siglab_core::domain::PositionSide;

    fn trade() -> TradeRecord {
        TradeRecord {
            symbol: "SPY".into(),
            side: PositionSide::Short,
            entry_bar: 3,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            entry_price: 100.0,
            exit_bar: 7,
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            exit_price: 90.0,
            quantity: 10.0,
            gross_pnl: 100.0,
            entry_fee: 1.0,
            exit_fee: 0.9,
            net_pnl: 98.1,
            bars_held: 4,
            forced_exit: false,
        }
    }

    #[test]
    fn trades_csv_has_header_and_row() {
        let csv = export_trades_csv(&[trade()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("symbol,side,entry_bar"));
        assert!(lines[1].starts_with("SPY,Short,3,2024-01-04,100.000000"));
        assert!(lines[1].contains(",1.90,98.10,9.8100,4,false"));
    }

    #[test]
    fn equity_csv_rejects_misaligned_curves() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let eq = [EquityPoint { date, equity: 100.0 }];
        assert!(export_equity_csv(&eq, &[]).is_err());

        let dd = [DrawdownPoint { date, drawdown: -0.05 }];
        let csv = export_equity_csv(&eq, &dd).unwrap();
        assert_eq!(csv, "date,equity,drawdown_pct\n2024-01-01,100.00,-5.0000\n");
    }

    #[test]
    fn optional_values_render_as_na() {
        assert_eq!(opt(None, 2, "%"), "n/a");
        assert_eq!(opt(Some(1.23456), 2, "%"), "1.23%");
    }
}
