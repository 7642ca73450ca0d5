//! siglab CLI — run, batch, download and strategy catalogue commands.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML config file
//! - `batch` — run every `[[strategies]]` entry of a batch file over one series
//! - `download` — fetch daily closes from Yahoo Finance into the Parquet cache
//! - `strategies` — list the strategy variants with their parameters and defaults
//! - `init` — print a starter config for a strategy

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use siglab_core::data::{CoverageResult, CsvFileProvider, DataProvider, ParquetCache, YahooProvider};
use siglab_core::engine::DirectionPolicy;
use siglab_core::signals::{ParamDefault, StrategyKind};
use siglab_core::sizers::SizeType;
use siglab_runner::{
    generate_batch_summary, run_batch_config, run_single_backtest, save_artifacts,
    BacktestConfig, BacktestResult, BacktestSection, BatchConfig, BatchMode, LoadOptions,
};

#[derive(Parser)]
#[command(name = "siglab", about = "siglab CLI — rule-based daily-bar backtesting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where prices come from and how the loader may fall back.
#[derive(clap::Args)]
struct DataArgs {
    /// Cache directory. Defaults to ./data.
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,

    /// Read `{SYMBOL}.csv` files (date,close) from this directory instead of Yahoo.
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Offline mode: cache only, no provider.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Fall back to a deterministic synthetic series when no data is found.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Ignore the cache and fetch again.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        data: DataArgs,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Run every strategy in a batch file over the same prices.
    Batch {
        /// Path to a TOML batch file.
        #[arg(long)]
        config: PathBuf,

        /// Run strategies one after another instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        #[command(flatten)]
        data: DataArgs,

        /// Output directory for run artifacts and the batch summary.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Download daily closes from Yahoo Finance and cache as Parquet.
    Download {
        /// Symbols to download (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// List strategy variants, their parameters and defaults.
    Strategies,
    /// Print a starter config for a strategy to stdout.
    Init {
        /// Strategy type, e.g. ema_crossover.
        #[arg(long, default_value = "ema_crossover")]
        strategy: String,

        /// Symbol to put in the config.
        #[arg(long, default_value = "SPY")]
        symbol: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            output_dir,
        } => run_backtest_cmd(config, data, output_dir),
        Commands::Batch {
            config,
            sequential,
            data,
            output_dir,
        } => run_batch_cmd(config, sequential, data, output_dir),
        Commands::Download {
            symbols,
            start,
            end,
            force,
            cache_dir,
        } => run_download(symbols, start, end, force, cache_dir),
        Commands::Strategies => {
            print_strategies();
            Ok(())
        }
        Commands::Init { strategy, symbol } => run_init(&strategy, &symbol),
    }
}

impl DataArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            offline: self.offline,
            synthetic: self.synthetic,
            force: self.force,
        }
    }

    fn provider(&self) -> Result<Option<Box<dyn DataProvider>>> {
        if self.offline {
            return Ok(None);
        }
        let provider: Box<dyn DataProvider> = match &self.csv_dir {
            Some(dir) => Box::new(CsvFileProvider::new(dir)),
            None => Box::new(YahooProvider::new().context("failed to set up Yahoo provider")?),
        };
        Ok(Some(provider))
    }
}

fn run_backtest_cmd(config_path: PathBuf, data: DataArgs, output_dir: PathBuf) -> Result<()> {
    let config = BacktestConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let cache = ParquetCache::new(&data.cache_dir);
    let provider = data.provider()?;

    let result = run_single_backtest(
        &config,
        &cache,
        provider.as_deref(),
        &data.load_options(),
        None,
    )?;

    print_summary(&result);

    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_batch_cmd(
    config_path: PathBuf,
    sequential: bool,
    data: DataArgs,
    output_dir: PathBuf,
) -> Result<()> {
    let batch = BatchConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let cache = ParquetCache::new(&data.cache_dir);
    let provider = data.provider()?;
    let mode = if sequential {
        BatchMode::Sequential
    } else {
        BatchMode::Parallel
    };

    let outcomes = run_batch_config(
        &batch,
        &cache,
        provider.as_deref(),
        &data.load_options(),
        mode,
        None,
    )?;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = 0usize;
    for (strategy, outcome) in batch.strategies.iter().zip(outcomes) {
        match outcome {
            Ok(result) => {
                let run_dir = save_artifacts(&result, &output_dir)?;
                info!(strategy = %result.strategy, dir = %run_dir.display(), "saved artifacts");
                results.push(result);
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error for {}: {e}", strategy.strategy_type);
            }
        }
    }

    let summary = generate_batch_summary(&results);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let summary_path = output_dir.join("batch_summary.md");
    std::fs::write(&summary_path, &summary)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    println!("{summary}");
    println!("Summary saved to: {}", summary_path.display());
    if results.first().is_some_and(|r| r.is_synthetic()) {
        println!("WARNING: Results based on SYNTHETIC data");
    }

    if failures > 0 {
        bail!("{failures} of {} runs failed", batch.strategies.len());
    }
    Ok(())
}

fn parse_date(s: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    s.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{s}'"))
    })
    .transpose()
}

fn run_download(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let start_date = parse_date(start.as_deref(), "start")?
        .unwrap_or_else(|| today - chrono::Duration::days(365 * 10));
    let end_date = parse_date(end.as_deref(), "end")?.unwrap_or(today);
    if start_date > end_date {
        bail!("--start {start_date} is after --end {end_date}");
    }

    let provider = YahooProvider::new().context("failed to set up Yahoo provider")?;
    let cache = ParquetCache::new(cache_dir);

    let mut errors = Vec::new();
    for symbol in &symbols {
        if !force && cache.covers_range(symbol, start_date, end_date) == CoverageResult::FullyCovered {
            println!("{symbol}: already cached");
            continue;
        }
        match provider.fetch(symbol, start_date, end_date) {
            Ok(fetched) => {
                cache
                    .write_range(&fetched.series, fetched.source, start_date, end_date)
                    .with_context(|| format!("caching {symbol}"))?;
                println!(
                    "{symbol}: {} bars ({} to {})",
                    fetched.series.len(),
                    fetched.series.first().date,
                    fetched.series.last().date
                );
            }
            Err(e) => {
                warn!(symbol = symbol.as_str(), error = %e, "download failed");
                errors.push((symbol, e));
            }
        }
    }

    if !errors.is_empty() {
        for (sym, err) in &errors {
            eprintln!("Error for {sym}: {err}");
        }
        bail!("{} of {} downloads failed", errors.len(), symbols.len());
    }

    Ok(())
}

fn print_strategies() {
    for kind in StrategyKind::ALL {
        println!("{} ({})", kind.name(), kind.label());
        println!("  {}", kind.summary());
        for p in kind.params() {
            let default = match p.default {
                ParamDefault::Number(v) => v.to_string(),
                ParamDefault::Text(s) => format!("\"{s}\""),
            };
            println!("    {:<14} {:<10} {}", p.name, default, p.description);
        }
        println!();
    }
}

fn run_init(strategy: &str, symbol: &str) -> Result<()> {
    let Some(kind) = StrategyKind::from_name(strategy) else {
        let valid: Vec<&str> = StrategyKind::ALL.iter().map(|k| k.name()).collect();
        bail!("unknown strategy '{strategy}'. Valid: {}", valid.join(", "));
    };

    let today = chrono::Local::now().date_naive();
    let config = BacktestConfig {
        backtest: BacktestSection {
            symbol: symbol.to_string(),
            start_date: today - chrono::Duration::days(365 * 5),
            end_date: today,
            initial_cash: 25_000.0,
            size: 10.0,
            size_type: SizeType::Percent,
            fees_pct: 0.10,
            direction: DirectionPolicy::LongOnly,
        },
        strategy: kind.default_config(),
    };
    print!("{}", config.to_toml()?);
    Ok(())
}

fn opt(v: Option<f64>, decimals: usize, suffix: &str) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.decimals$}{suffix}"))
}

fn print_summary(result: &BacktestResult) {
    let s = &result.stats;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Strategy:       {}", result.strategy);
    if let (Some(start), Some(end)) = (s.start_date, s.end_date) {
        println!("Period:         {start} to {end} ({} days)", s.period_days);
    }
    println!(
        "Bars:           {} ({} warmup)",
        result.bar_count, result.warmup_bars
    );
    println!(
        "Signals:        {} entry / {} exit",
        result.entry_signals, result.exit_signals
    );
    println!("Trades:         {}", s.total_trades);
    if !result.skipped_entries.is_empty() {
        println!("Skipped:        {} (insufficient funds)", result.skipped_entries.len());
    }
    println!();
    println!("--- Performance ---");
    println!("Start Value:    {:.2}", s.start_value);
    println!("End Value:      {:.2}", s.end_value);
    println!("Total Return:   {:.2}%", s.total_return_pct);
    println!("Benchmark:      {}", opt(s.benchmark_return_pct, 2, "%"));
    println!("Annualized:     {}", opt(s.annualized_return_pct, 2, "%"));
    println!("Sharpe:         {}", opt(s.sharpe_ratio, 3, ""));
    println!("Sortino:        {}", opt(s.sortino_ratio, 3, ""));
    println!("Calmar:         {}", opt(s.calmar_ratio, 3, ""));
    println!("Max Drawdown:   {:.2}%", s.max_drawdown_pct);
    println!("Max DD Length:  {} days", s.max_drawdown_duration_days);
    println!("Win Rate:       {}", opt(s.win_rate_pct, 1, "%"));
    println!("Best Trade:     {}", opt(s.best_trade_pct, 2, "%"));
    println!("Worst Trade:    {}", opt(s.worst_trade_pct, 2, "%"));
    println!("Profit Factor:  {}", opt(s.profit_factor, 2, ""));
    println!("Total Fees:     {:.2}", s.total_fees);
    if result.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
