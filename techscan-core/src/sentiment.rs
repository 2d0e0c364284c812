//! Headline sentiment.
//!
//! A small financial lexicon scores each headline in [-1, 1]; a ticker's
//! sentiment is the mean over its most recent headlines. Fetch failures are
//! absorbed here and read as neutral.

use crate::data::{Headline, MarketDataProvider};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const DEFAULT_HEADLINE_LIMIT: usize = 5;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "rallies", "surge", "surges", "soar", "soars", "gain", "gains",
    "profit", "growth", "beat", "beats", "upgrade", "upgrades", "upgraded", "outperform",
    "strong", "positive", "rise", "rises", "record", "breakthrough", "innovation", "success",
    "exceed", "exceeds", "momentum", "optimistic", "advance", "dividend", "buyback",
    "upside", "recovery", "rebound", "expansion", "robust", "accelerating", "raises",
    "raised", "tailwind", "wins", "boost", "boosts",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "declines", "loss", "losses", "fall", "falls", "plunge", "plunges",
    "crash", "miss", "misses", "downgrade", "downgrades", "downgraded", "underperform", "weak",
    "negative", "drop", "drops", "concern", "concerns", "risk", "fail", "fails", "disappoint",
    "disappoints", "slump", "warning", "warns", "pessimistic", "retreat", "fear", "fears",
    "trouble", "dilution", "headwind", "lawsuit", "litigation", "recall", "investigation",
    "probe", "default", "bankruptcy", "layoff", "layoffs", "downside", "overvalued", "bubble",
    "lowered", "suspended", "slowing", "pressure",
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't",
    "won't", "hardly", "barely", "without",
];

const INTENSIFIERS: &[&str] = &[
    "very", "sharply", "significantly", "strongly", "massive", "huge", "extremely",
];

/// Tokens after a negation word that have their polarity flipped.
const NEGATION_WINDOW: usize = 3;
const INTENSIFIER_WEIGHT: f64 = 2.0;

/// Lexicon-based polarity scorer.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
    intensifiers: HashSet<&'static str>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polarity of one piece of text: (pos - neg) / (pos + neg) over
    /// matched terms, 0.0 when nothing matches.
    pub fn polarity(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '"'))
            .filter(|w| !w.is_empty())
            .collect();

        let mut pos = 0.0;
        let mut neg = 0.0;

        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive.contains(*word);
            let is_negative = self.negative.contains(*word);
            if !is_positive && !is_negative {
                continue;
            }

            let window = &words[i.saturating_sub(NEGATION_WINDOW)..i];
            let negated = window.iter().any(|w| self.negation.contains(*w));
            let weight = if i > 0 && self.intensifiers.contains(words[i - 1]) {
                INTENSIFIER_WEIGHT
            } else {
                1.0
            };

            if is_positive != negated {
                pos += weight;
            } else {
                neg += weight;
            }
        }

        if pos + neg == 0.0 {
            0.0
        } else {
            ((pos - neg) / (pos + neg)).clamp(-1.0, 1.0)
        }
    }

    /// Mean polarity over headlines, 0.0 for none.
    pub fn mean_polarity(&self, headlines: &[Headline]) -> f64 {
        if headlines.is_empty() {
            return 0.0;
        }
        let total: f64 = headlines.iter().map(|h| self.polarity(&h.title)).sum();
        total / headlines.len() as f64
    }
}

/// Sentiment in [-1, 1] for a ticker from its `limit` most recent headlines.
///
/// Never fails: a provider error is logged and reads as neutral.
pub fn estimate_sentiment(provider: &dyn MarketDataProvider, ticker: &str, limit: usize) -> f64 {
    match provider.fetch_headlines(ticker, limit) {
        Ok(mut headlines) => {
            headlines.truncate(limit);
            let score = LexiconScorer::new().mean_polarity(&headlines);
            debug!(ticker, headlines = headlines.len(), score, "sentiment");
            score
        }
        Err(e) => {
            warn!(ticker, error = %e, "headline fetch failed, using neutral sentiment");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataError, FetchResult};
    use chrono::NaiveDate;

    struct Headlines(Result<Vec<&'static str>, ()>);

    impl MarketDataProvider for Headlines {
        fn name(&self) -> &str {
            "headlines"
        }
        fn fetch_bars(&self, symbol: &str, _: NaiveDate, _: NaiveDate) -> Result<FetchResult, DataError> {
            Err(DataError::SymbolNotFound { symbol: symbol.to_string() })
        }
        fn fetch_headlines(&self, _: &str, _: usize) -> Result<Vec<Headline>, DataError> {
            match &self.0 {
                Ok(titles) => Ok(titles
                    .iter()
                    .map(|t| Headline { title: t.to_string(), publisher: None })
                    .collect()),
                Err(()) => Err(DataError::NetworkUnreachable("offline".into())),
            }
        }
        fn fetch_company_name(&self, _: &str) -> Result<Option<String>, DataError> {
            Ok(None)
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn plain_polarity() {
        let s = LexiconScorer::new();
        assert_eq!(s.polarity("Shares rally after earnings beat"), 1.0);
        assert_eq!(s.polarity("Company faces lawsuit, shares plunge"), -1.0);
        assert_eq!(s.polarity("Company announces annual meeting date"), 0.0);
        assert_eq!(s.polarity("Strong growth offset by lawsuit"), 1.0 / 3.0);
    }

    #[test]
    fn negation_flips_within_window() {
        let s = LexiconScorer::new();
        assert_eq!(s.polarity("Results were not strong"), -1.0);
        assert_eq!(s.polarity("No sign of weak demand"), 1.0);
        // negation too far back to matter
        assert_eq!(s.polarity("Not that anyone asked but growth continued"), 1.0);
    }

    #[test]
    fn intensifier_weighs_double() {
        let s = LexiconScorer::new();
        // pos 2, neg 1
        assert!((s.polarity("Very strong quarter despite risk") - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn estimate_averages_headlines() {
        let p = Headlines(Ok(vec!["Shares surge", "Shares plunge", "Guidance raised", "Dull day"]));
        // 1 - 1 + 1 + 0 over 4
        assert_eq!(estimate_sentiment(&p, "AAPL", 5), 0.25);
    }

    #[test]
    fn estimate_respects_limit() {
        let p = Headlines(Ok(vec!["Shares surge", "Shares plunge"]));
        assert_eq!(estimate_sentiment(&p, "AAPL", 1), 1.0);
    }

    #[test]
    fn estimate_neutral_on_nothing() {
        assert_eq!(estimate_sentiment(&Headlines(Ok(vec![])), "AAPL", 5), 0.0);
        assert_eq!(estimate_sentiment(&Headlines(Err(())), "AAPL", 5), 0.0);
    }
}
