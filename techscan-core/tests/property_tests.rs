//! Property tests for score invariants.
//!
//! Uses proptest to verify:
//! 1. Base score stays in [0, 100] for any inputs
//! 2. Final score stays in [0, 100] for any base and any prior score
//! 3. Volume classification is total and consistent with its bonus
//! 4. Indicator readings never carry NaN

use chrono::NaiveDate;
use proptest::prelude::*;
use techscan_core::domain::{Bar, ScoreState, Signal, VolumeState};
use techscan_core::indicators::compute_reading;
use techscan_core::scoring::{
    calculate_score, final_score, trend_adjustment, volume_adjustment,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    1.0..1000.0_f64
}

fn arb_rsi() -> impl Strategy<Value = f64> {
    0.0..=100.0_f64
}

fn arb_sentiment() -> impl Strategy<Value = f64> {
    -1.0..=1.0_f64
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(5.0..500.0_f64, 0..160)
}

// ── 1. Base score bounds ─────────────────────────────────────────────

proptest! {
    #[test]
    fn base_score_in_range(
        ema20 in arb_price(),
        ema50 in arb_price(),
        rsi in arb_rsi(),
        sentiment in arb_sentiment(),
    ) {
        let score = calculate_score(ema20, ema50, rsi, sentiment);
        prop_assert!((0..=100).contains(&score));
    }

    #[test]
    fn base_score_in_range_for_wild_inputs(
        rsi in -1e6..1e6_f64,
        sentiment in -1e3..1e3_f64,
    ) {
        let score = calculate_score(2.0, 1.0, rsi, sentiment);
        prop_assert!((0..=100).contains(&score));
    }
}

// ── 2. Final score bounds ────────────────────────────────────────────

proptest! {
    #[test]
    fn final_score_in_range(
        base in 0..=100_i32,
        previous in proptest::option::of(0..=100_i32),
        volume_relative in 0.0..5.0_f64,
    ) {
        let (state, trend_bonus) = trend_adjustment(base, previous);
        let (_, volume_bonus) = volume_adjustment(volume_relative);
        let score = final_score(base, trend_bonus, volume_bonus);
        prop_assert!((0..=100).contains(&score));
        prop_assert_eq!(state == ScoreState::New, previous.is_none());
        let signal = Signal::from_score(score);
        prop_assert_eq!(signal == Signal::Buy, score >= Signal::BUY_MIN);
        prop_assert_eq!(
            signal == Signal::Watch,
            (Signal::WATCH_MIN..Signal::BUY_MIN).contains(&score)
        );
    }
}

// ── 3. Volume classification ─────────────────────────────────────────

proptest! {
    #[test]
    fn volume_state_matches_bonus(volume_relative in 0.0..10.0_f64) {
        let (state, bonus) = volume_adjustment(volume_relative);
        match state {
            VolumeState::High => prop_assert!(volume_relative >= 1.2 && bonus == 5),
            VolumeState::Low => prop_assert!(volume_relative < 0.8 && bonus == -5),
            VolumeState::Normal => prop_assert!(bonus == 0),
        }
    }
}

// ── 4. Readings carry no NaN ─────────────────────────────────────────

proptest! {
    #[test]
    fn reading_is_finite_or_absent(closes in arb_closes()) {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 100 + i as u64,
            })
            .collect();

        match compute_reading(&bars) {
            Some(r) => {
                prop_assert!(r.clean_rows >= 50);
                prop_assert!(r.ema20.is_finite() && r.ema50.is_finite());
                prop_assert!((0.0..=100.0).contains(&r.rsi));
                prop_assert!(r.volume_relative.is_finite() && r.volume_relative >= 0.0);
            }
            None => prop_assert!(bars.len() < 99),
        }
    }
}
