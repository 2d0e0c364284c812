//! Simple Moving Average (SMA).
//!
//! SMA[t] = mean(x[t-period+1..=t]). The window includes the current bar.
//! Lookback: period - 1. Any NaN in the window makes that position NaN.

use super::Indicator;
use crate::domain::Bar;

/// Which bar field the average runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmaSource {
    Close,
    Volume,
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: SmaSource,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            source: SmaSource::Close,
            name: format!("sma_{period}"),
        }
    }

    /// Rolling mean of traded volume.
    pub fn volume(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            source: SmaSource::Volume,
            name: format!("volume_sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = match self.source {
            SmaSource::Close => bars.iter().map(|b| b.close).collect(),
            SmaSource::Volume => bars.iter().map(|b| b.volume as f64).collect(),
        };
        sma_of_series(&values, self.period)
    }
}

pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().sum::<f64>() / period as f64;
    }

    result
}
