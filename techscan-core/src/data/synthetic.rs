//! Synthetic data provider for offline runs.
//!
//! Generates a deterministic random walk per ticker (the seed is derived
//! from the symbol), plus a few canned headlines. Nothing here touches the
//! network, so `scan --synthetic` works on a plane.

use super::provider::{DataError, DataSource, FetchResult, Headline, MarketDataProvider};
use crate::domain::Bar;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HEADLINES: &[&str] = &[
    "{} shares rally after strong quarterly earnings beat",
    "{} faces lawsuit over patent dispute",
    "Analysts upgrade {} on record cloud growth",
    "{} warns of weak demand and slowing revenue",
    "{} announces new product launch",
    "{} stock falls as investors fear margin pressure",
    "{} raises guidance, shares surge",
];

/// Deterministic random-walk provider.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    /// Mixed into every per-symbol seed, so different runs can differ on purpose.
    pub salt: u64,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn rng_for(&self, symbol: &str, stream: u64) -> StdRng {
        // FNV-1a over the symbol bytes
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for b in symbol.bytes() {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        StdRng::seed_from_u64(hash ^ self.salt ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }

    /// Weekday bars from `start` to `end` inclusive.
    pub fn generate_bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        let mut rng = self.rng_for(symbol, 0);
        let mut bars = Vec::new();
        let mut price = rng.gen_range(20.0..400.0_f64);
        let drift = rng.gen_range(-0.002..0.003_f64);
        let base_volume = rng.gen_range(1_000_000..20_000_000u64) as f64;
        let mut current = start;

        while current <= end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += chrono::Duration::days(1);
                continue;
            }

            let daily_return: f64 = drift + rng.gen_range(-0.025..0.025);
            let open = price;
            let close = (price * (1.0 + daily_return)).max(1.0);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = (base_volume * rng.gen_range(0.5..1.6)) as u64;

            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += chrono::Duration::days(1);
        }

        bars
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        if start > end {
            return Err(DataError::Other(format!("empty range {start}..{end}")));
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: self.generate_bars(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }

    fn fetch_headlines(&self, symbol: &str, limit: usize) -> Result<Vec<Headline>, DataError> {
        let mut rng = self.rng_for(symbol, 1);
        let count = rng.gen_range(0..=limit.min(HEADLINES.len()));
        Ok((0..count)
            .map(|_| {
                let template = HEADLINES[rng.gen_range(0..HEADLINES.len())];
                Headline {
                    title: template.replace("{}", symbol),
                    publisher: Some("Synthetic Wire".to_string()),
                }
            })
            .collect())
    }

    fn fetch_company_name(&self, symbol: &str) -> Result<Option<String>, DataError> {
        Ok(Some(format!("{symbol} Holdings (synthetic)")))
    }

    fn is_available(&self) -> bool {
        true
    }
}
