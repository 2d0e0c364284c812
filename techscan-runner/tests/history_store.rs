//! CSV history store against a real temp directory.

use chrono::NaiveDate;
use tempfile::TempDir;

use techscan_core::domain::Signal;
use techscan_runner::history::{CsvHistoryStore, HistoricalRecord, HistoryStore, StoreError};

fn rec(day: u32, ticker: &str, score: i32) -> HistoricalRecord {
    HistoricalRecord {
        date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        ticker: ticker.to_string(),
        company_name: format!("{ticker} Inc"),
        score,
        rsi: 48.5,
        sentiment: -0.12,
        signal: Signal::from_score(score),
        momentum: Signal::from_score(score).priority().to_string(),
    }
}

#[test]
fn missing_store_reads_empty() {
    let dir = TempDir::new().unwrap();
    let store = CsvHistoryStore::new(dir.path().join("nope.csv"));
    assert!(store.load_all().is_empty());
}

#[test]
fn append_creates_file_with_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data/nested/score_history.csv");
    let mut store = CsvHistoryStore::new(&path);

    store.append(&[rec(1, "AAPL", 72), rec(1, "MSFT", 55)]).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let header = contents.lines().next().unwrap();
    assert_eq!(header, "date,ticker,company_name,score,rsi,sentiment,signal,momentum");
    assert!(contents.contains("2024-03-01,AAPL,AAPL Inc,72,48.5,-0.12,Buy,High priority"));
    assert_eq!(store.load_all(), vec![rec(1, "AAPL", 72), rec(1, "MSFT", 55)]);
    assert!(!path.with_extension("csv.tmp").exists());
}

#[test]
fn same_key_last_write_wins() {
    let dir = TempDir::new().unwrap();
    let mut store = CsvHistoryStore::new(dir.path().join("h.csv"));

    store.append(&[rec(1, "AAPL", 60)]).unwrap();
    store.append(&[rec(1, "AAPL", 66)]).unwrap();

    assert_eq!(store.load_all(), vec![rec(1, "AAPL", 66)]);
}

#[test]
fn history_accumulates_across_days() {
    let dir = TempDir::new().unwrap();
    let mut store = CsvHistoryStore::new(dir.path().join("h.csv"));

    for day in 1..=5 {
        store.append(&[rec(day, "NVDA", 60 + day as i32)]).unwrap();
    }
    // reopening sees the same rows
    let reopened = CsvHistoryStore::new(store.path());
    assert_eq!(reopened.load_all().len(), 5);
}

#[test]
fn names_with_commas_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut store = CsvHistoryStore::new(dir.path().join("h.csv"));
    let mut record = rec(2, "BRK-B", 50);
    record.company_name = "Berkshire Hathaway, Inc. \"B\"".to_string();

    store.append(std::slice::from_ref(&record)).unwrap();
    assert_eq!(store.load_all(), vec![record]);
}

#[test]
fn malformed_rows_are_skipped_on_load_but_block_append() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("h.csv");
    let original = "date,ticker,company_name,score,rsi,sentiment,signal,momentum\n\
2024-03-01,AAPL,Apple,72,48.5,0.1,Buy,High priority\n\
2024-03-02,AAPL,Apple,not-a-number,48.5,0.1,Buy,High priority\n\
2024-03-03,AAPL,Apple,64,41.0,0.0,Watch,Medium priority\n";
    std::fs::write(&path, original).unwrap();

    let mut store = CsvHistoryStore::new(&path);
    let loaded = store.load_all();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].score, 64);

    let err = store.append(&[rec(4, "AAPL", 70)]).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { row: 2, .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}
