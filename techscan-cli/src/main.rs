//! techscan CLI: scan, history, alerts and universe commands.
//!
//! Commands:
//! - `scan`: score the universe, print the ranking, append to the history
//! - `history`: one ticker's stored scores with count / mean / max
//! - `alerts`: upward threshold crossings, newest first
//! - `universe`: print the (cached) scan universe
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` level);
//! tables go to stdout.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use techscan_core::data::{
    CircuitBreaker, CompanyNames, FileUniverse, MarketDataProvider, SyntheticProvider, Universe,
    UniverseCache, UniverseSource, WikipediaUniverse, YahooProvider,
};
use techscan_core::domain::TickerSnapshot;
use techscan_runner::{
    detect_crossings, run_scan, series_for, sort_newest_first, CsvHistoryStore, HistoryStore,
    MemoryHistoryStore, ScanConfig, ScanError, ScanReport, SeriesStats,
};

/// Tickers scanned in `--synthetic` mode when no universe file is given.
const DEMO_TICKERS: &[&str] = &[
    "AAPL", "ADBE", "AMD", "AVGO", "CRM", "CSCO", "GOOGL", "INTC", "META", "MSFT", "NVDA",
    "ORCL", "QCOM", "TXN",
];

#[derive(Parser)]
#[command(name = "techscan", about = "techscan: daily technical and sentiment scan of tech stocks")]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every ticker in the universe and append the results to the history.
    Scan {
        /// Read the universe from a TOML file instead of Wikipedia.
        #[arg(long)]
        universe_file: Option<PathBuf>,

        /// Ignore the cached universe and fetch it again.
        #[arg(long, default_value_t = false)]
        refresh_universe: bool,

        /// Offline mode: deterministic random-walk data, no network access.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Only scan the first N tickers (alphabetical).
        #[arg(long)]
        limit: Option<usize>,

        /// Also write the full report as JSON.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Score and print, but do not touch the history file.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Show the stored score series for one ticker.
    History {
        /// Ticker symbol (e.g., NVDA).
        ticker: String,
    },
    /// List upward threshold crossings, newest first.
    Alerts {
        /// Score to cross. Defaults to `crossing_threshold` from the config.
        #[arg(long)]
        threshold: Option<i32>,
    },
    /// Print the scan universe grouped by source.
    Universe {
        /// Ignore the cached universe and fetch it again.
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScanConfig::default(),
    };

    match cli.command {
        Commands::Scan {
            universe_file,
            refresh_universe,
            synthetic,
            limit,
            export,
            dry_run,
        } => run_scan_cmd(
            &config,
            universe_file,
            refresh_universe,
            synthetic,
            limit,
            export,
            dry_run,
        ),
        Commands::History { ticker } => run_history(&config, &ticker),
        Commands::Alerts { threshold } => {
            run_alerts(&config, threshold.unwrap_or(config.crossing_threshold))
        }
        Commands::Universe { refresh } => run_universe(&config, refresh),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn load_universe(config: &ScanConfig, universe_file: Option<PathBuf>, refresh: bool) -> Result<Universe> {
    if let Some(path) = universe_file {
        return FileUniverse::new(&path)
            .fetch()
            .with_context(|| format!("reading universe file {}", path.display()));
    }
    let cache = UniverseCache::new(&config.cache_dir, config.universe_ttl());
    let source = WikipediaUniverse::new()?;
    cache
        .get_or_fetch(&source as &dyn UniverseSource, refresh, Utc::now())
        .context("fetching the scan universe")
}

#[allow(clippy::too_many_arguments)]
fn run_scan_cmd(
    config: &ScanConfig,
    universe_file: Option<PathBuf>,
    refresh_universe: bool,
    synthetic: bool,
    limit: Option<usize>,
    export: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let mut tickers = if synthetic && universe_file.is_none() {
        DEMO_TICKERS.iter().map(|t| t.to_string()).collect()
    } else {
        load_universe(config, universe_file, refresh_universe)?.all_tickers()
    };
    if let Some(n) = limit {
        tickers.truncate(n);
    }
    if tickers.is_empty() {
        bail!("the universe is empty, nothing to scan");
    }

    let provider: Box<dyn MarketDataProvider> = if synthetic {
        Box::new(SyntheticProvider::new())
    } else {
        let breaker = Arc::new(CircuitBreaker::default_provider());
        Box::new(YahooProvider::new(breaker)?)
    };

    let mut names = if synthetic {
        CompanyNames::in_memory(config.company_ttl())
    } else {
        CompanyNames::open(&config.cache_dir, config.company_ttl())
    };
    let mut store = CsvHistoryStore::new(&config.history_path);
    let today = today();

    let report = match run_scan(&tickers, provider.as_ref(), &mut names, &store, config, today) {
        Ok(report) => report,
        Err(ScanError::NoResults { skipped }) => {
            bail!("no ticker could be scored ({skipped} skipped); history left untouched")
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&report);

    let records = report.to_records();
    let mut history = store.load_all();
    if dry_run {
        println!("\nDry run: {} record(s) not written.", records.len());
        let mut preview = MemoryHistoryStore::with_records(history);
        preview.append(&records)?;
        history = preview.load_all();
    } else {
        store
            .append(&records)
            .with_context(|| format!("appending to {}", store.path().display()))?;
        println!(
            "\nSaved {} record(s) to {}",
            records.len(),
            store.path().display()
        );
        history = store.load_all();
    }

    let crossings_today = detect_crossings(&history, config.crossing_threshold)
        .into_iter()
        .filter(|e| e.date == today)
        .count();
    println!(
        "Crossings above {} today: {crossings_today}",
        config.crossing_threshold
    );

    if let Some(path) = export {
        report.export_json(&path)?;
        println!("Report exported to {}", path.display());
    }

    Ok(())
}

fn print_report(report: &ScanReport) {
    println!();
    println!("=== Tech Scan {} ===", report.date);
    println!(
        "Market regime: {} (buy threshold {})",
        report.regime, report.buy_threshold
    );
    println!(
        "Scored: {}   Skipped: {}",
        report.ranked.len(),
        report.skipped.len()
    );
    println!();
    println!(
        "{:<7} {:<26} {:>10} {:>5} {:<6} {:<9} {:<6} {:>5} {:>6}",
        "Ticker", "Company", "Price", "Score", "Signal", "Trend", "Volume", "RSI", "Sent"
    );
    println!("{}", "-".repeat(90));
    for s in &report.ranked {
        print_row(s);
    }

    let top = report.top_opportunities();
    println!();
    if top.is_empty() {
        println!("No opportunities at or above {}.", report.buy_threshold);
    } else {
        println!("--- Top opportunities (score >= {}) ---", report.buy_threshold);
        for s in top {
            println!(
                "{} ({}) score {} [{}]",
                s.ticker,
                s.company_name,
                s.final_score,
                s.priority()
            );
            for reason in &s.reasons {
                println!("    - {reason}");
            }
        }
    }

    if !report.skipped.is_empty() {
        println!();
        println!("--- Skipped ---");
        for s in &report.skipped {
            println!("{:<7} {}", s.ticker, s.reason);
        }
    }
}

fn print_row(s: &TickerSnapshot) {
    let company: String = s.company_name.chars().take(26).collect();
    println!(
        "{:<7} {:<26} {:>10.2} {:>5} {:<6} {:<9} {:<6} {:>5.1} {:>6.2}",
        s.ticker,
        company,
        s.price,
        s.final_score,
        s.signal.as_str(),
        s.score_state.to_string(),
        s.volume_state.to_string(),
        s.rsi,
        s.sentiment
    );
}

fn run_history(config: &ScanConfig, ticker: &str) -> Result<()> {
    let ticker = ticker.to_uppercase();
    let store = CsvHistoryStore::new(&config.history_path);
    let series = series_for(&store.load_all(), &ticker);

    let Some(stats) = SeriesStats::of(&series) else {
        println!("No history for {ticker} in {}", store.path().display());
        return Ok(());
    };

    println!("{:<12} {:>5} {:>6} {:>6} {:<6} {}", "Date", "Score", "RSI", "Sent", "Signal", "Momentum");
    println!("{}", "-".repeat(56));
    for r in &series {
        println!(
            "{:<12} {:>5} {:>6.1} {:>6.2} {:<6} {}",
            r.date.to_string(),
            r.score,
            r.rsi,
            r.sentiment,
            r.signal.as_str(),
            r.momentum
        );
    }
    println!();
    println!(
        "{ticker}: {} record(s), mean {:.1}, max {}",
        stats.count, stats.mean, stats.max
    );
    Ok(())
}

fn run_alerts(config: &ScanConfig, threshold: i32) -> Result<()> {
    if !(0..=100).contains(&threshold) {
        bail!("threshold must be within 0..=100, got {threshold}");
    }
    let store = CsvHistoryStore::new(&config.history_path);
    let mut events = detect_crossings(&store.load_all(), threshold);
    sort_newest_first(&mut events);

    if events.is_empty() {
        println!("No crossings above {threshold}.");
        return Ok(());
    }

    println!("{:<12} {:<7} {:<30} {:>5}", "Date", "Ticker", "Company", "Score");
    println!("{}", "-".repeat(57));
    for e in &events {
        println!(
            "{:<12} {:<7} {:<30} {:>5}",
            e.date.to_string(),
            e.ticker,
            e.company_name,
            e.score
        );
    }
    println!("\n{} crossing(s) above {threshold}.", events.len());
    Ok(())
}

fn run_universe(config: &ScanConfig, refresh: bool) -> Result<()> {
    let universe = load_universe(config, None, refresh)?;
    for sector in universe.sector_names() {
        let tickers = universe.sector_tickers(sector).unwrap_or_default();
        println!("{sector} ({})", tickers.len());
        println!("  {}", tickers.join(" "));
    }
    println!("\nTotal unique tickers: {}", universe.ticker_count());
    Ok(())
}
