//! techscan runner: scan orchestration, market regime, score history, alerts.
//!
//! This crate builds on `techscan-core` to provide:
//! - TOML scan configuration
//! - The sequential scan loop with per-ticker containment
//! - Benchmark regime and the adaptive buy threshold
//! - Append-only CSV score history (last write wins per date and ticker)
//! - Threshold crossing detection over that history

pub mod config;
pub mod crossings;
pub mod history;
pub mod regime;
pub mod scan;

pub use config::{ConfigError, ScanConfig};
pub use crossings::{detect_crossings, sort_newest_first, CrossingEvent, DEFAULT_CROSSING_THRESHOLD};
pub use history::{
    previous_score, series_for, CsvHistoryStore, HistoricalRecord, HistoryStore,
    MemoryHistoryStore, SeriesStats, StoreError,
};
pub use regime::{buy_threshold, compute_regime, MarketRegime};
pub use scan::{run_scan, scan_ticker, ScanError, ScanReport, SkipReason, SkippedTicker, TickerOutcome};
