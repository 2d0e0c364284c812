//! Latest indicator snapshot for one ticker.

use super::{Ema, Indicator, IndicatorValues, Rsi, Sma};
use crate::domain::{with_close, Bar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const EMA_FAST: usize = 20;
pub const EMA_SLOW: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const VOLUME_WINDOW: usize = 20;

/// Rows with every indicator defined that a ticker needs before it is scored.
pub const MIN_CLEAN_ROWS: usize = 50;

/// Indicator values at the last bar where all of them are defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub date: NaiveDate,
    pub price: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub rsi: f64,
    /// Last volume over its 20-bar mean; 1.0 when the mean is unusable.
    pub volume_relative: f64,
    pub clean_rows: usize,
}

/// Compute the latest reading from daily bars.
///
/// Bars without a close are dropped first. Returns `None` when fewer than
/// [`MIN_CLEAN_ROWS`] rows have EMA20, EMA50 and RSI14 all defined.
pub fn compute_reading(bars: &[Bar]) -> Option<IndicatorReading> {
    let bars = with_close(bars);
    if bars.is_empty() {
        return None;
    }

    let ema_fast = Ema::new(EMA_FAST);
    let ema_slow = Ema::new(EMA_SLOW);
    let rsi = Rsi::new(RSI_PERIOD);

    let mut values = IndicatorValues::new();
    values.compute(&ema_fast, &bars);
    values.compute(&ema_slow, &bars);
    values.compute(&rsi, &bars);

    let clean: Vec<usize> = (0..bars.len()).filter(|&i| values.all_valid_at(i)).collect();
    if clean.len() < MIN_CLEAN_ROWS {
        return None;
    }
    let last = *clean.last()?;

    let volume_mean = Sma::volume(VOLUME_WINDOW).compute(&bars);
    let volume_relative = relative_volume(bars[last].volume as f64, volume_mean[last]);

    Some(IndicatorReading {
        date: bars[last].date,
        price: bars[last].close,
        ema20: values.get(ema_fast.name(), last)?,
        ema50: values.get(ema_slow.name(), last)?,
        rsi: values.get(rsi.name(), last)?,
        volume_relative,
        clean_rows: clean.len(),
    })
}

/// Rows of `bars` that would have every indicator defined.
///
/// EMA50 has the longest warm-up, so this is the closed-bar count minus its
/// lookback.
pub fn count_clean_rows(bars: &[Bar]) -> usize {
    with_close(bars).len().saturating_sub(EMA_SLOW - 1)
}

/// Current volume over its rolling mean, neutral (1.0) when either side is
/// missing or not positive.
///
/// A zero current volume is how a missing value arrives from the provider
/// (e.g. a partial trailing bar), so it reads as unknown rather than low.
pub fn relative_volume(current: f64, mean: f64) -> f64 {
    if mean.is_finite() && mean > 0.0 && current.is_finite() && current > 0.0 {
        current / mean
    } else {
        1.0
    }
}
