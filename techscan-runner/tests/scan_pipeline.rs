//! Scan loop against a scripted provider (no network).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use chrono::NaiveDate;
use tempfile::TempDir;

use techscan_core::data::{CompanyNames, DataError, DataSource, FetchResult, Headline, MarketDataProvider};
use techscan_core::domain::{Bar, ScoreState, Signal};
use techscan_runner::history::{CsvHistoryStore, HistoricalRecord, HistoryStore, MemoryHistoryStore};
use techscan_runner::regime::MarketRegime;
use techscan_runner::scan::{run_scan, ScanError, SkipReason};
use techscan_runner::ScanConfig;

enum Script {
    Bars(Vec<Bar>),
    Fail,
    /// Fails and opens the breaker for every later call.
    Trip,
}

struct ScriptedProvider {
    scripts: HashMap<String, Script>,
    tripped: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedProvider {
    fn new(scripts: Vec<(&str, Script)>) -> Self {
        Self {
            scripts: scripts.into_iter().map(|(t, s)| (t.to_string(), s)).collect(),
            tripped: Cell::new(false),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_bars(&self, symbol: &str, _: NaiveDate, _: NaiveDate) -> Result<FetchResult, DataError> {
        self.calls.borrow_mut().push(symbol.to_string());
        match self.scripts.get(symbol) {
            Some(Script::Bars(bars)) => Ok(FetchResult {
                symbol: symbol.to_string(),
                bars: bars.clone(),
                source: DataSource::Synthetic,
            }),
            Some(Script::Fail) => Err(DataError::NetworkUnreachable("connection reset".into())),
            Some(Script::Trip) => {
                self.tripped.set(true);
                Err(DataError::CircuitBreakerTripped)
            }
            None => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn fetch_headlines(&self, _: &str, _: usize) -> Result<Vec<Headline>, DataError> {
        Ok(Vec::new())
    }

    fn fetch_company_name(&self, symbol: &str) -> Result<Option<String>, DataError> {
        Ok(Some(format!("{symbol} Corp")))
    }

    fn is_available(&self) -> bool {
        !self.tripped.get()
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

fn bars(closes: impl Iterator<Item = f64>) -> Vec<Bar> {
    let closes: Vec<f64> = closes.collect();
    let first = today() - chrono::Duration::days(closes.len() as i64 - 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: first + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        })
        .collect()
}

/// EMA20 above EMA50 (+40) with RSI 100 (-20): base 20.
fn rising() -> Script {
    Script::Bars(bars((0..150).map(|i| 100.0 + i as f64)))
}

/// EMA20 below EMA50 with RSI 0: base 0.
fn falling() -> Script {
    Script::Bars(bars((0..150).map(|i| 300.0 - i as f64)))
}

fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

fn names() -> CompanyNames {
    CompanyNames::in_memory(chrono::Duration::days(7))
}

#[test]
fn failing_tickers_do_not_stop_the_scan() {
    let provider = ScriptedProvider::new(vec![
        ("QQQ", rising()),
        ("AAPL", rising()),
        ("MSFT", falling()),
        ("BAD", Script::Fail),
        ("EMPTY", Script::Bars(Vec::new())),
        ("SHORT", Script::Bars(bars((0..60).map(|i| 50.0 + i as f64)))),
    ]);
    let report = run_scan(
        &tickers(&["MSFT", "BAD", "AAPL", "EMPTY", "SHORT"]),
        &provider,
        &mut names(),
        &MemoryHistoryStore::new(),
        &ScanConfig::default(),
        today(),
    )
    .unwrap();

    assert_eq!(report.regime, MarketRegime::Bullish);
    assert_eq!(report.buy_threshold, 70);
    let ranked: Vec<(&str, i32)> = report
        .ranked
        .iter()
        .map(|s| (s.ticker.as_str(), s.final_score))
        .collect();
    assert_eq!(ranked, vec![("AAPL", 20), ("MSFT", 0)]);
    assert_eq!(report.ranked[0].company_name, "AAPL Corp");
    assert_eq!(report.ranked[0].score_state, ScoreState::New);
    assert!(report.top_opportunities().is_empty());

    let skipped: HashMap<&str, &SkipReason> = report
        .skipped
        .iter()
        .map(|s| (s.ticker.as_str(), &s.reason))
        .collect();
    assert!(matches!(skipped["BAD"], SkipReason::Provider(DataError::NetworkUnreachable(_))));
    assert!(matches!(skipped["EMPTY"], SkipReason::NoData));
    assert!(matches!(
        skipped["SHORT"],
        SkipReason::InsufficientHistory { clean_rows: 11 }
    ));
}

#[test]
fn unknown_benchmark_raises_threshold() {
    let provider = ScriptedProvider::new(vec![("AAPL", rising())]);
    let report = run_scan(
        &tickers(&["AAPL"]),
        &provider,
        &mut names(),
        &MemoryHistoryStore::new(),
        &ScanConfig::default(),
        today(),
    )
    .unwrap();
    assert_eq!(report.regime, MarketRegime::Unknown);
    assert_eq!(report.buy_threshold, 75);
}

#[test]
fn weak_benchmark_raises_threshold() {
    let provider = ScriptedProvider::new(vec![("QQQ", falling()), ("AAPL", rising())]);
    let report = run_scan(
        &tickers(&["AAPL"]),
        &provider,
        &mut names(),
        &MemoryHistoryStore::new(),
        &ScanConfig::default(),
        today(),
    )
    .unwrap();
    assert_eq!(report.regime, MarketRegime::Weak);
    assert_eq!(report.buy_threshold, 75);
}

#[test]
fn nothing_scored_is_an_error() {
    let provider = ScriptedProvider::new(vec![("QQQ", rising()), ("BAD", Script::Fail)]);
    let err = run_scan(
        &tickers(&["BAD", "GONE"]),
        &provider,
        &mut names(),
        &MemoryHistoryStore::new(),
        &ScanConfig::default(),
        today(),
    )
    .unwrap_err();
    assert!(matches!(err, ScanError::NoResults { skipped: 2 }));
}

#[test]
fn tripped_breaker_skips_the_rest_without_requests() {
    let provider = ScriptedProvider::new(vec![
        ("QQQ", rising()),
        ("AAPL", rising()),
        ("TRIP", Script::Trip),
        ("MSFT", rising()),
        ("NVDA", rising()),
    ]);
    let report = run_scan(
        &tickers(&["AAPL", "TRIP", "MSFT", "NVDA"]),
        &provider,
        &mut names(),
        &MemoryHistoryStore::new(),
        &ScanConfig::default(),
        today(),
    )
    .unwrap();

    assert_eq!(report.ranked.len(), 1);
    assert_eq!(report.skipped.len(), 3);
    assert!(report
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::Provider(DataError::CircuitBreakerTripped))));
    assert_eq!(*provider.calls.borrow(), vec!["QQQ", "AAPL", "TRIP"]);
}

#[test]
fn previous_day_drives_trend_state() {
    let provider = ScriptedProvider::new(vec![("QQQ", rising()), ("AAPL", rising())]);
    let yesterday = HistoricalRecord {
        date: today().pred_opt().unwrap(),
        ticker: "AAPL".into(),
        company_name: "AAPL Corp".into(),
        score: 10,
        rsi: 50.0,
        sentiment: 0.0,
        signal: Signal::Avoid,
        momentum: "Low priority".into(),
    };
    // a same-day row is ignored when picking the previous score
    let same_day = HistoricalRecord {
        date: today(),
        score: 95,
        ..yesterday.clone()
    };
    let history = MemoryHistoryStore::with_records(vec![yesterday, same_day]);

    let report = run_scan(
        &tickers(&["AAPL"]),
        &provider,
        &mut names(),
        &history,
        &ScanConfig::default(),
        today(),
    )
    .unwrap();

    let aapl = &report.ranked[0];
    assert_eq!(aapl.base_score, 20);
    assert_eq!(aapl.score_state, ScoreState::Growing);
    assert_eq!(aapl.final_score, 25);
}

#[test]
fn rerun_on_same_day_replaces_rows() {
    let dir = TempDir::new().unwrap();
    let config = ScanConfig {
        history_path: dir.path().join("score_history.csv"),
        ..ScanConfig::default()
    };
    let provider = ScriptedProvider::new(vec![("QQQ", rising()), ("AAPL", rising()), ("MSFT", falling())]);
    let mut store = CsvHistoryStore::new(&config.history_path);
    let universe = tickers(&["AAPL", "MSFT"]);

    for _ in 0..2 {
        let report = run_scan(&universe, &provider, &mut names(), &store, &config, today()).unwrap();
        store.append(&report.to_records()).unwrap();
    }

    let rows = store.load_all();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.date == today()));
}

#[test]
fn export_writes_json() {
    let dir = TempDir::new().unwrap();
    let provider = ScriptedProvider::new(vec![("QQQ", rising()), ("AAPL", rising())]);
    let report = run_scan(
        &tickers(&["AAPL"]),
        &provider,
        &mut names(),
        &MemoryHistoryStore::new(),
        &ScanConfig::default(),
        today(),
    )
    .unwrap();

    let path = dir.path().join("out/report.json");
    report.export_json(&path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["ranked"][0]["ticker"], "AAPL");
    assert_eq!(value["regime"], "Bullish");
    assert_eq!(value["ranked"][0]["reasons"].as_array().unwrap().len(), 3);
}
