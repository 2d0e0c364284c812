//! Scan loop: score every ticker in the universe, one at a time.
//!
//! A failing ticker never aborts the run. It is recorded as skipped with the
//! reason and the loop moves on. Once the provider's circuit breaker is open
//! the remaining tickers are skipped without further requests.

use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use techscan_core::data::{CompanyNames, DataError, MarketDataProvider};
use techscan_core::domain::TickerSnapshot;
use techscan_core::indicators::{compute_reading, count_clean_rows};
use techscan_core::scoring::score_ticker;
use techscan_core::sentiment::estimate_sentiment;

use crate::config::ScanConfig;
use crate::history::{previous_score, HistoricalRecord, HistoryStore};
use crate::regime::{buy_threshold, compute_regime, MarketRegime};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no ticker produced a score ({skipped} skipped)")]
    NoResults { skipped: usize },
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Why a ticker was left out of the ranking.
#[derive(Debug)]
pub enum SkipReason {
    /// The provider returned no bars.
    NoData,
    /// Too few rows with every indicator defined.
    InsufficientHistory { clean_rows: usize },
    Provider(DataError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientHistory { clean_rows } => {
                write!(f, "insufficient history ({clean_rows} clean rows)")
            }
            SkipReason::Provider(e) => write!(f, "{e}"),
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug)]
pub enum TickerOutcome {
    Scored(TickerSnapshot),
    Skipped { ticker: String, reason: SkipReason },
}

#[derive(Debug, Serialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

/// Result of one scan.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub date: NaiveDate,
    pub regime: MarketRegime,
    pub buy_threshold: i32,
    /// Final score descending, ticker ascending on ties.
    pub ranked: Vec<TickerSnapshot>,
    pub skipped: Vec<SkippedTicker>,
}

impl ScanReport {
    /// Ranked snapshots at or above the regime's buy threshold.
    pub fn top_opportunities(&self) -> Vec<&TickerSnapshot> {
        self.ranked
            .iter()
            .filter(|s| s.final_score >= self.buy_threshold)
            .collect()
    }

    pub fn to_records(&self) -> Vec<HistoricalRecord> {
        self.ranked
            .iter()
            .map(|s| HistoricalRecord::from_snapshot(s, self.date))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ScanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn export_json(&self, path: &Path) -> Result<(), ScanError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "report exported");
        Ok(())
    }
}

/// Score a single ticker.
pub fn scan_ticker(
    ticker: &str,
    provider: &dyn MarketDataProvider,
    names: &mut CompanyNames,
    history: &[HistoricalRecord],
    config: &ScanConfig,
    today: NaiveDate,
) -> TickerOutcome {
    let skipped = |reason: SkipReason| TickerOutcome::Skipped {
        ticker: ticker.to_string(),
        reason,
    };

    let start = today - config.lookback();
    let bars = match provider.fetch_bars(ticker, start, today) {
        Ok(fetched) => fetched.bars,
        Err(e) => return skipped(SkipReason::Provider(e)),
    };
    if bars.is_empty() {
        return skipped(SkipReason::NoData);
    }

    let Some(reading) = compute_reading(&bars) else {
        return skipped(SkipReason::InsufficientHistory {
            clean_rows: count_clean_rows(&bars),
        });
    };

    let sentiment = estimate_sentiment(provider, ticker, config.headline_limit);
    let company_name = names.resolve(provider, ticker, Utc::now());
    let previous = previous_score(history, ticker, today);

    TickerOutcome::Scored(score_ticker(
        ticker,
        &company_name,
        &reading,
        sentiment,
        previous,
    ))
}

/// Run the full scan over `tickers` as of `today`.
///
/// Nothing is written to `history`; callers persist `report.to_records()`.
pub fn run_scan(
    tickers: &[String],
    provider: &dyn MarketDataProvider,
    names: &mut CompanyNames,
    history: &dyn HistoryStore,
    config: &ScanConfig,
    today: NaiveDate,
) -> Result<ScanReport, ScanError> {
    let regime = compute_regime(provider, &config.benchmark, today - config.lookback(), today);
    let threshold = buy_threshold(regime, config.buy_threshold, config.weak_market_threshold);
    let records = history.load_all();

    info!(
        provider = provider.name(),
        tickers = tickers.len(),
        %regime,
        buy_threshold = threshold,
        "scan started"
    );

    let mut ranked = Vec::new();
    let mut skipped = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        let outcome = if provider.is_available() {
            scan_ticker(ticker, provider, names, &records, config, today)
        } else {
            TickerOutcome::Skipped {
                ticker: ticker.clone(),
                reason: SkipReason::Provider(DataError::CircuitBreakerTripped),
            }
        };

        match outcome {
            TickerOutcome::Scored(snapshot) => {
                debug!(
                    ticker = %snapshot.ticker,
                    score = snapshot.final_score,
                    signal = %snapshot.signal,
                    index = i + 1,
                    total = tickers.len(),
                    "scored"
                );
                ranked.push(snapshot);
            }
            TickerOutcome::Skipped { ticker, reason } => {
                warn!(%ticker, %reason, "ticker skipped");
                skipped.push(SkippedTicker { ticker, reason });
            }
        }
    }

    if let Err(e) = names.save() {
        warn!(error = %e, "failed to save company name cache");
    }

    if ranked.is_empty() {
        return Err(ScanError::NoResults {
            skipped: skipped.len(),
        });
    }

    ranked.sort_by(|a, b| {
        b.final_score
            .cmp(&a.final_score)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    info!(
        scored = ranked.len(),
        skipped = skipped.len(),
        "scan finished"
    );

    Ok(ScanReport {
        date: today,
        regime,
        buy_threshold: threshold,
        ranked,
        skipped,
    })
}
