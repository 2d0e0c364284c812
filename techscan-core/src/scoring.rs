//! Score engine.
//!
//! A base score from trend, momentum and sentiment, adjusted by how the
//! score moved since the previous run and by relative volume. All scores
//! are integers in [0, 100].

use crate::domain::{ScoreState, Signal, TickerSnapshot, Trend, VolumeState};
use crate::indicators::IndicatorReading;

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

const TREND_POINTS: i32 = 40;
const HEALTHY_RSI_POINTS: i32 = 30;
const CORRECTION_RSI_POINTS: i32 = 20;
const OVERBOUGHT_PENALTY: i32 = 20;
const OVERSOLD_PENALTY: i32 = 20;

const GROWING_BONUS: i32 = 5;
const STRONG_BONUS: i32 = 3;
const WEAKENING_PENALTY: i32 = 5;
/// Both today's base and the previous score at or above this count as strong.
const STRONG_LEVEL: i32 = 70;

const HIGH_VOLUME: f64 = 1.2;
const LOW_VOLUME: f64 = 0.8;
const VOLUME_POINTS: i32 = 5;

fn clamp_score(raw: i32) -> i32 {
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

fn sentiment_points(sentiment: f64) -> i32 {
    if sentiment.is_finite() {
        (sentiment * 10.0).trunc() as i32
    } else {
        0
    }
}

/// Base score in [0, 100].
pub fn calculate_score(ema20: f64, ema50: f64, rsi: f64, sentiment: f64) -> i32 {
    let mut score = 0;

    if Trend::from_emas(ema20, ema50) == Trend::Bullish {
        score += TREND_POINTS;
    }

    if (40.0..=55.0).contains(&rsi) {
        score += HEALTHY_RSI_POINTS;
    } else if (30.0..40.0).contains(&rsi) {
        score += CORRECTION_RSI_POINTS;
    }
    if rsi > 70.0 {
        score -= OVERBOUGHT_PENALTY;
    }
    if rsi < 25.0 {
        score -= OVERSOLD_PENALTY;
    }

    score += sentiment_points(sentiment);

    clamp_score(score)
}

/// Three human-readable reasons, in order: trend, RSI zone, news tone.
pub fn explain_score(ema20: f64, ema50: f64, rsi: f64, sentiment: f64) -> Vec<String> {
    let trend = match Trend::from_emas(ema20, ema50) {
        Trend::Bullish => "Bullish trend (EMA20 above EMA50)".to_string(),
        Trend::Bearish => "Bearish trend (EMA20 at or below EMA50)".to_string(),
    };

    let zone = if (40.0..=55.0).contains(&rsi) {
        "healthy zone"
    } else if (30.0..40.0).contains(&rsi) {
        "correction zone"
    } else if rsi > 70.0 {
        "overbought"
    } else {
        "weak"
    };

    let tone = if sentiment > 0.1 {
        "Positive"
    } else if sentiment < -0.1 {
        "Negative"
    } else {
        "Neutral"
    };

    vec![
        trend,
        format!("RSI {zone} ({rsi:.1})"),
        format!("{tone} news sentiment"),
    ]
}

/// Movement of the score against the previous stored score.
///
/// Rules are checked in order and the first match wins.
pub fn trend_adjustment(base_score: i32, previous: Option<i32>) -> (ScoreState, i32) {
    match previous {
        None => (ScoreState::New, 0),
        Some(prev) if base_score > prev => (ScoreState::Growing, GROWING_BONUS),
        Some(prev) if base_score >= STRONG_LEVEL && prev >= STRONG_LEVEL => {
            (ScoreState::Strong, STRONG_BONUS)
        }
        Some(_) => (ScoreState::Weakening, -WEAKENING_PENALTY),
    }
}

pub fn volume_adjustment(volume_relative: f64) -> (VolumeState, i32) {
    if volume_relative >= HIGH_VOLUME {
        (VolumeState::High, VOLUME_POINTS)
    } else if volume_relative < LOW_VOLUME {
        (VolumeState::Low, -VOLUME_POINTS)
    } else {
        (VolumeState::Normal, 0)
    }
}

/// Base plus both adjustments, clamped once.
pub fn final_score(base_score: i32, trend_bonus: i32, volume_bonus: i32) -> i32 {
    clamp_score(base_score + trend_bonus + volume_bonus)
}

/// Score one ticker from its latest indicator reading.
///
/// `previous` is the ticker's most recent stored score before today, if any.
pub fn score_ticker(
    ticker: &str,
    company_name: &str,
    reading: &IndicatorReading,
    sentiment: f64,
    previous: Option<i32>,
) -> TickerSnapshot {
    let base_score = calculate_score(reading.ema20, reading.ema50, reading.rsi, sentiment);
    let (score_state, trend_bonus) = trend_adjustment(base_score, previous);
    let (volume_state, volume_bonus) = volume_adjustment(reading.volume_relative);
    let final_score = final_score(base_score, trend_bonus, volume_bonus);

    TickerSnapshot {
        ticker: ticker.to_string(),
        company_name: company_name.to_string(),
        price: reading.price,
        ema20: reading.ema20,
        ema50: reading.ema50,
        rsi: reading.rsi,
        sentiment,
        volume_relative: reading.volume_relative,
        base_score,
        final_score,
        score_state,
        volume_state,
        signal: Signal::from_score(final_score),
        reasons: explain_score(reading.ema20, reading.ema50, reading.rsi, sentiment),
    }
}
