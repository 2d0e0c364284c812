//! Look-ahead contamination tests for the scan indicators.
//!
//! No indicator value at bar t may depend on price data from bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..100) and on the full series
//! (bars 0..200). Bars 0..100 must be identical between both runs.

use chrono::NaiveDate;
use techscan_core::domain::Bar;
use techscan_core::indicators::*;

/// Deterministic pseudo-random walk using a simple LCG.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price = (price + change).max(10.0);

        bars.push(Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open: price - 0.5,
            high: price + 2.0,
            low: price - 2.0,
            close: price,
            volume: 1000 + (seed % 5000),
        });
    }

    bars
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let truncated = &full_bars[..truncated_len];
    let full_result = indicator.compute(full_bars);
    let truncated_result = indicator.compute(truncated);

    assert_eq!(truncated_result.len(), truncated_len);
    for i in 0..truncated_len {
        let (a, b) = (truncated_result[i], full_result[i]);
        assert!(
            (a.is_nan() && b.is_nan()) || a == b,
            "{}: bar {i} differs (truncated={a}, full={b})",
            indicator.name()
        );
    }
}

#[test]
fn ema_no_lookahead() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Ema::new(20), &bars, 100);
    assert_no_lookahead(&Ema::new(50), &bars, 100);
}

#[test]
fn rsi_no_lookahead() {
    assert_no_lookahead(&Rsi::default(), &make_test_bars(200), 100);
}

#[test]
fn volume_sma_no_lookahead() {
    assert_no_lookahead(&Sma::volume(20), &make_test_bars(200), 100);
}

#[test]
fn reading_on_prefix_matches_full_series() {
    let bars = make_test_bars(200);
    let reading = compute_reading(&bars[..120]).unwrap();

    let ema20 = Ema::new(20).compute(&bars);
    let ema50 = Ema::new(50).compute(&bars);
    let rsi = Rsi::default().compute(&bars);

    assert_eq!(reading.date, bars[119].date);
    assert_eq!(reading.ema20, ema20[119]);
    assert_eq!(reading.ema50, ema50[119]);
    assert_eq!(reading.rsi, rsi[119]);
    assert_eq!(reading.clean_rows, 120 - 49);
}
