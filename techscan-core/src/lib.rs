//! techscan core: market data, indicators, sentiment and the score engine.
//!
//! This crate holds everything needed to turn one ticker's raw data into a
//! scored snapshot:
//! - Domain types (bars, snapshots, signals)
//! - Market data providers (Yahoo Finance, synthetic) behind one trait
//! - Universe discovery and the on-disk metadata caches
//! - EMA / RSI / volume indicators and the latest-reading guard
//! - Headline sentiment and the score engine
//!
//! Persistence, crossings and the scan loop live in `techscan-runner`.

pub mod data;
pub mod domain;
pub mod indicators;
pub mod scoring;
pub mod sentiment;

pub use domain::{Bar, ScoreState, Signal, TickerSnapshot, Trend, VolumeState};
pub use indicators::{compute_reading, IndicatorReading};
pub use scoring::score_ticker;
pub use sentiment::estimate_sentiment;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: values handed between scan stages are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::TickerSnapshot>();
        require_sync::<domain::TickerSnapshot>();
        require_send::<indicators::IndicatorReading>();
        require_sync::<indicators::IndicatorReading>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::Universe>();
        require_sync::<data::Universe>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
    }
}
