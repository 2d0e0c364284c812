//! Technical indicators used by the score engine.
//!
//! Indicators are pure functions: bar history in, numeric series out, one
//! value per bar. Warm-up positions are `f64::NAN`. `reading` turns the
//! series into the single latest snapshot the score engine consumes.

pub mod ema;
pub mod reading;
pub mod rsi;
pub mod sma;

pub use ema::{ema_of_series, Ema};
pub use reading::{compute_reading, count_clean_rows, IndicatorReading, MIN_CLEAN_ROWS};
pub use rsi::Rsi;
pub use sma::{sma_of_series, Sma, SmaSource};

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `bars`; the first
/// `lookback()` values are `f64::NAN`. No value at bar t may depend on bars
/// after t.
pub trait Indicator {
    /// Human-readable name (e.g., "ema_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Named indicator series computed over the same bars.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute an indicator and store it under its name.
    pub fn compute(&mut self, indicator: &dyn Indicator, bars: &[Bar]) {
        self.series
            .insert(indicator.name().to_string(), indicator.compute(bars));
    }

    /// Value of a named series at a bar index, `None` if missing or warm-up.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
            .filter(|v| v.is_finite())
    }

    /// True when every series has a finite value at `bar_index`.
    pub fn all_valid_at(&self, bar_index: usize) -> bool {
        self.series
            .values()
            .all(|v| v.get(bar_index).is_some_and(|x| x.is_finite()))
    }
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high/low one unit outside,
/// volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
