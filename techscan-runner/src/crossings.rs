//! Upward threshold crossings in the score history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::history::HistoricalRecord;

pub const DEFAULT_CROSSING_THRESHOLD: i32 = 70;

/// A ticker's score moved from below the threshold to at or above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossingEvent {
    pub date: NaiveDate,
    pub ticker: String,
    pub company_name: String,
    pub score: i32,
}

/// Scan each ticker's history (oldest first) for adjacent pairs where the
/// score goes from `< threshold` to `>= threshold`.
///
/// Events are returned grouped by ticker (alphabetical), oldest first.
pub fn detect_crossings(records: &[HistoricalRecord], threshold: i32) -> Vec<CrossingEvent> {
    let mut by_ticker: BTreeMap<&str, Vec<&HistoricalRecord>> = BTreeMap::new();
    for record in records {
        by_ticker.entry(record.ticker.as_str()).or_default().push(record);
    }

    let mut events = Vec::new();
    for series in by_ticker.values_mut() {
        if series.len() < 2 {
            continue;
        }
        series.sort_by_key(|r| r.date);
        for pair in series.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            if prev.score < threshold && curr.score >= threshold {
                events.push(CrossingEvent {
                    date: curr.date,
                    ticker: curr.ticker.clone(),
                    company_name: curr.company_name.clone(),
                    score: curr.score,
                });
            }
        }
    }
    events
}

/// Newest first, ties by ticker.
pub fn sort_newest_first(events: &mut [CrossingEvent]) {
    events.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.ticker.cmp(&b.ticker)));
}
