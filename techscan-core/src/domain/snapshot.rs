//! Per-ticker scan output and the labels attached to it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the EMA20 / EMA50 trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    pub fn from_emas(ema20: f64, ema50: f64) -> Self {
        if ema20 > ema50 {
            Trend::Bullish
        } else {
            Trend::Bearish
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "Bullish"),
            Trend::Bearish => write!(f, "Bearish"),
        }
    }
}

/// Day-over-day movement of a ticker's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreState {
    /// No earlier record for this ticker.
    New,
    /// Today's base score is strictly above the previous score.
    Growing,
    /// Both scores are at or above 70.
    Strong,
    Weakening,
}

impl fmt::Display for ScoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreState::New => "New",
            ScoreState::Growing => "Growing",
            ScoreState::Strong => "Strong",
            ScoreState::Weakening => "Weakening",
        };
        write!(f, "{s}")
    }
}

/// Volume relative to its 20-day average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeState {
    Low,
    Normal,
    High,
}

impl fmt::Display for VolumeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolumeState::Low => "Low",
            VolumeState::Normal => "Normal",
            VolumeState::High => "High",
        };
        write!(f, "{s}")
    }
}

/// Action bucket derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Watch,
    Avoid,
}

impl Signal {
    /// Minimum final score for `Buy`.
    pub const BUY_MIN: i32 = 70;
    /// Minimum final score for `Watch`.
    pub const WATCH_MIN: i32 = 55;

    pub fn from_score(final_score: i32) -> Self {
        if final_score >= Self::BUY_MIN {
            Signal::Buy
        } else if final_score >= Self::WATCH_MIN {
            Signal::Watch
        } else {
            Signal::Avoid
        }
    }

    /// Momentum label persisted alongside the signal.
    pub fn priority(&self) -> &'static str {
        match self {
            Signal::Buy => "High priority",
            Signal::Watch => "Medium priority",
            Signal::Avoid => "Low priority",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "Buy",
            Signal::Watch => "Watch",
            Signal::Avoid => "Avoid",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything computed for one ticker in one scan.
///
/// Built fresh each run. Only a projection (`HistoricalRecord` in the
/// runner) is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub ticker: String,
    pub company_name: String,
    pub price: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub rsi: f64,
    pub sentiment: f64,
    pub volume_relative: f64,
    pub base_score: i32,
    pub final_score: i32,
    pub score_state: ScoreState,
    pub volume_state: VolumeState,
    pub signal: Signal,
    pub reasons: Vec<String>,
}

impl TickerSnapshot {
    pub fn trend(&self) -> Trend {
        Trend::from_emas(self.ema20, self.ema50)
    }

    pub fn priority(&self) -> &'static str {
        self.signal.priority()
    }
}
