//! Score history: one row per (date, ticker), kept indefinitely.
//!
//! The CSV store rewrites the whole file on every append (write to .tmp,
//! rename into place), so a crash mid-write leaves the previous file intact.
//! A later write for the same (date, ticker) replaces the earlier row.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use techscan_core::domain::{Signal, TickerSnapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("history CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("refusing to overwrite unreadable history {path} (row {row}): {message}")]
    Corrupt {
        path: PathBuf,
        row: u64,
        message: String,
    },
}

/// One persisted score observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub company_name: String,
    pub score: i32,
    pub rsi: f64,
    pub sentiment: f64,
    pub signal: Signal,
    pub momentum: String,
}

impl HistoricalRecord {
    /// Project a snapshot onto the persisted columns.
    ///
    /// RSI is rounded to one decimal, sentiment to two.
    pub fn from_snapshot(snapshot: &TickerSnapshot, date: NaiveDate) -> Self {
        Self {
            date,
            ticker: snapshot.ticker.clone(),
            company_name: snapshot.company_name.clone(),
            score: snapshot.final_score,
            rsi: round_to(snapshot.rsi, 1),
            sentiment: round_to(snapshot.sentiment, 2),
            signal: snapshot.signal,
            momentum: snapshot.priority().to_string(),
        }
    }

    fn key(&self) -> (NaiveDate, String) {
        (self.date, self.ticker.clone())
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Persistence for score history.
pub trait HistoryStore {
    /// Insert or replace records by (date, ticker). Within one batch the last
    /// record for a key wins.
    fn append(&mut self, records: &[HistoricalRecord]) -> Result<(), StoreError>;

    /// Every stored record. A missing or unreadable store reads as empty.
    fn load_all(&self) -> Vec<HistoricalRecord>;
}

/// Merge `incoming` into `existing`, keeping first-seen order of keys.
fn upsert(existing: Vec<HistoricalRecord>, incoming: &[HistoricalRecord]) -> Vec<HistoricalRecord> {
    let mut merged: Vec<HistoricalRecord> = Vec::with_capacity(existing.len() + incoming.len());
    let mut index: HashMap<(NaiveDate, String), usize> = HashMap::new();

    for record in existing.into_iter().chain(incoming.iter().cloned()) {
        match index.get(&record.key()) {
            Some(&i) => merged[i] = record,
            None => {
                index.insert(record.key(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// CSV file store.
///
/// Columns: `date,ticker,company_name,score,rsi,sentiment,signal,momentum`.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row, failing on the first one that does not parse.
    fn read_strict(&self) -> Result<Vec<HistoricalRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for (i, row) in reader.deserialize::<HistoricalRecord>().enumerate() {
            match row {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(StoreError::Corrupt {
                        path: self.path.clone(),
                        row: i as u64 + 1,
                        message: e.to_string(),
                    })
                }
            }
        }
        Ok(records)
    }

    fn write_atomic(&self, records: &[HistoricalRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl HistoryStore for CsvHistoryStore {
    fn append(&mut self, records: &[HistoricalRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let existing = self.read_strict()?;
        let before = existing.len();
        let merged = upsert(existing, records);
        self.write_atomic(&merged)?;
        info!(
            path = %self.path.display(),
            appended = records.len(),
            replaced = before + records.len() - merged.len(),
            total = merged.len(),
            "history updated"
        );
        Ok(())
    }

    fn load_all(&self) -> Vec<HistoricalRecord> {
        if !self.path.exists() {
            return Vec::new();
        }
        let mut reader = match csv::Reader::from_path(&self.path) {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history unreadable, treating as empty");
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<HistoricalRecord>() {
            match row {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    debug!(error = %e, "skipping malformed history row");
                }
            }
        }
        if skipped > 0 {
            warn!(path = %self.path.display(), skipped, "skipped malformed history rows");
        }
        records
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    records: Vec<HistoricalRecord>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HistoricalRecord>) -> Self {
        Self {
            records: upsert(Vec::new(), &records),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&mut self, records: &[HistoricalRecord]) -> Result<(), StoreError> {
        let existing = std::mem::take(&mut self.records);
        self.records = upsert(existing, records);
        Ok(())
    }

    fn load_all(&self) -> Vec<HistoricalRecord> {
        self.records.clone()
    }
}

/// The ticker's most recent score dated strictly before `date`.
pub fn previous_score(records: &[HistoricalRecord], ticker: &str, date: NaiveDate) -> Option<i32> {
    records
        .iter()
        .filter(|r| r.ticker == ticker && r.date < date)
        .max_by_key(|r| r.date)
        .map(|r| r.score)
}

/// One ticker's records, oldest first.
pub fn series_for(records: &[HistoricalRecord], ticker: &str) -> Vec<HistoricalRecord> {
    let mut series: Vec<HistoricalRecord> = records
        .iter()
        .filter(|r| r.ticker == ticker)
        .cloned()
        .collect();
    series.sort_by_key(|r| r.date);
    series
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub max: i32,
}

impl SeriesStats {
    /// `None` for an empty series.
    pub fn of(series: &[HistoricalRecord]) -> Option<Self> {
        let max = series.iter().map(|r| r.score).max()?;
        let total: i64 = series.iter().map(|r| i64::from(r.score)).sum();
        Some(Self {
            count: series.len(),
            mean: total as f64 / series.len() as f64,
            max,
        })
    }
}
