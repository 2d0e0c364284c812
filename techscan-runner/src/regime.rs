//! Market regime from the benchmark index.
//!
//! A bullish benchmark (EMA20 above EMA50) keeps the normal buy threshold;
//! anything else, including a benchmark we could not read, raises it.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use techscan_core::data::MarketDataProvider;
use techscan_core::domain::with_close;
use techscan_core::indicators::ema_of_series;
use techscan_core::indicators::reading::{EMA_FAST, EMA_SLOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRegime {
    Bullish,
    Weak,
    Unknown,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketRegime::Bullish => "Bullish",
            MarketRegime::Weak => "Weak",
            MarketRegime::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

/// Regime from the benchmark's closing prices, oldest first.
pub fn regime_from_closes(closes: &[f64]) -> MarketRegime {
    let fast = ema_of_series(closes, EMA_FAST);
    let slow = ema_of_series(closes, EMA_SLOW);
    match (fast.last(), slow.last()) {
        (Some(f), Some(s)) if f.is_finite() && s.is_finite() => {
            if f > s {
                MarketRegime::Bullish
            } else {
                MarketRegime::Weak
            }
        }
        _ => MarketRegime::Unknown,
    }
}

/// Fetch the benchmark and classify it. Fetch errors read as `Unknown`.
pub fn compute_regime(
    provider: &dyn MarketDataProvider,
    benchmark: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> MarketRegime {
    let regime = match provider.fetch_bars(benchmark, start, end) {
        Ok(fetched) => {
            let closes: Vec<f64> = with_close(&fetched.bars).iter().map(|b| b.close).collect();
            regime_from_closes(&closes)
        }
        Err(e) => {
            warn!(benchmark, error = %e, "benchmark fetch failed, regime unknown");
            MarketRegime::Unknown
        }
    };
    info!(benchmark, %regime, "market regime");
    regime
}

/// Buy threshold for the regime.
pub fn buy_threshold(regime: MarketRegime, bullish: i32, otherwise: i32) -> i32 {
    match regime {
        MarketRegime::Bullish => bullish,
        MarketRegime::Weak | MarketRegime::Unknown => otherwise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_benchmark_is_bullish() {
        let closes: Vec<f64> = (0..120).map(|i| 300.0 + i as f64).collect();
        assert_eq!(regime_from_closes(&closes), MarketRegime::Bullish);
    }

    #[test]
    fn falling_or_flat_benchmark_is_weak() {
        let falling: Vec<f64> = (0..120).map(|i| 400.0 - i as f64).collect();
        assert_eq!(regime_from_closes(&falling), MarketRegime::Weak);
        assert_eq!(regime_from_closes(&[350.0; 80]), MarketRegime::Weak);
    }

    #[test]
    fn short_or_empty_benchmark_is_unknown() {
        assert_eq!(regime_from_closes(&[]), MarketRegime::Unknown);
        assert_eq!(regime_from_closes(&[1.0; 49]), MarketRegime::Unknown);
    }

    #[test]
    fn thresholds() {
        assert_eq!(buy_threshold(MarketRegime::Bullish, 70, 75), 70);
        assert_eq!(buy_threshold(MarketRegime::Weak, 70, 75), 75);
        assert_eq!(buy_threshold(MarketRegime::Unknown, 70, 75), 75);
    }
}
