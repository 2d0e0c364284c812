//! Bar: one daily OHLCV observation for a ticker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
///
/// Missing price fields from the provider are stored as `f64::NAN` and a
/// missing volume as `0`; indicator code filters on `has_close()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if the close is a usable number.
    pub fn has_close(&self) -> bool {
        self.close.is_finite()
    }
}

/// Keep only bars with a usable close, in their original order.
pub fn with_close(bars: &[Bar]) -> Vec<Bar> {
    bars.iter().filter(|b| b.has_close()).cloned().collect()
}
