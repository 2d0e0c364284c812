//! Scan universe: ticker lists grouped by index or sector membership.
//!
//! Two sources:
//! - a TOML file (`[sectors] Name = ["AAPL", ...]`) for fixed universes
//! - the Wikipedia constituents pages: Nasdaq-100 plus the S&P 500
//!   Information Technology sector
//!
//! The Wikipedia source depends on the page layout. A page without a table
//! carrying the expected header columns is a `ResponseFormatChanged` error,
//! and the scan cannot start without a universe.

use super::provider::DataError;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const NASDAQ_100_URL: &str = "https://en.wikipedia.org/wiki/Nasdaq-100";
pub const SP_500_URL: &str = "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";
pub const TECH_SECTOR: &str = "Information Technology";

const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Ticker lists keyed by group name (index or sector).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DataError::UniverseFile(format!("read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content).map_err(|e| DataError::UniverseFile(format!("parse TOML: {e}")))
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, DataError> {
        toml::to_string_pretty(self)
            .map_err(|e| DataError::UniverseFile(format!("serialize TOML: {e}")))
    }

    /// Every ticker across all groups, trimmed, deduplicated and sorted.
    pub fn all_tickers(&self) -> Vec<String> {
        self.sectors
            .values()
            .flatten()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Get tickers for a specific group.
    pub fn sector_tickers(&self, sector: &str) -> Option<&[String]> {
        self.sectors.get(sector).map(|v| v.as_slice())
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.keys().map(|s| s.as_str()).collect()
    }

    /// Number of distinct tickers.
    pub fn ticker_count(&self) -> usize {
        self.all_tickers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticker_count() == 0
    }
}

/// Anything that can produce the scan universe.
pub trait UniverseSource {
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<Universe, DataError>;
}

/// A universe read from a TOML file on every fetch.
pub struct FileUniverse {
    path: std::path::PathBuf,
}

impl FileUniverse {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UniverseSource for FileUniverse {
    fn name(&self) -> &str {
        "toml_file"
    }

    fn fetch(&self) -> Result<Universe, DataError> {
        Universe::from_file(&self.path)
    }
}

/// Nasdaq-100 plus S&P 500 Information Technology, scraped from Wikipedia.
pub struct WikipediaUniverse {
    client: reqwest::blocking::Client,
}

impl WikipediaUniverse {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(BROWSER_AGENT)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn get_page(&self, url: &str) -> Result<String, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(format!("{url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Other(format!("HTTP {status} for {url}")));
        }
        resp.text()
            .map_err(|e| DataError::NetworkUnreachable(format!("{url}: {e}")))
    }
}

impl UniverseSource for WikipediaUniverse {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn fetch(&self) -> Result<Universe, DataError> {
        let nasdaq = parse_nasdaq_100(&self.get_page(NASDAQ_100_URL)?)?;
        let sp_tech = parse_sp500_sector(&self.get_page(SP_500_URL)?, TECH_SECTOR)?;
        info!(
            nasdaq_100 = nasdaq.len(),
            sp500_tech = sp_tech.len(),
            "fetched universe from Wikipedia"
        );

        let mut sectors = BTreeMap::new();
        sectors.insert("Nasdaq-100".to_string(), nasdaq);
        sectors.insert(format!("S&P 500 {TECH_SECTOR}"), sp_tech);
        Ok(Universe { sectors })
    }
}

/// A parsed HTML table: header names and cell text per body row.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.column(n).is_some())
    }
}

fn selector(css: &str) -> Result<Selector, DataError> {
    Selector::parse(css).map_err(|e| DataError::Other(format!("bad selector {css:?}: {e}")))
}

/// Cell text with whitespace collapsed and footnote markers (`[1]`) removed.
fn cell_text(cell: ElementRef<'_>) -> String {
    let raw: String = cell.text().collect::<Vec<_>>().join(" ");
    let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    while let Some(start) = text.rfind('[') {
        if text.ends_with(']') {
            text.truncate(start);
            text = text.trim_end().to_string();
        } else {
            break;
        }
    }
    text
}

/// Parse every `<table>` in a document.
///
/// The header is the first row made only of `<th>` cells; every later row
/// with at least one `<td>` is a body row.
pub fn parse_tables(html: &str) -> Result<Vec<HtmlTable>, DataError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;
    let td_sel = selector("td")?;

    let mut tables = Vec::new();
    for table in document.select(&table_sel) {
        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for row in table.select(&row_sel) {
            let has_td = row.select(&td_sel).next().is_some();
            let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
            if cells.is_empty() {
                continue;
            }
            if headers.is_none() {
                if !has_td {
                    headers = Some(cells);
                }
            } else if has_td {
                rows.push(cells);
            }
        }
        if let Some(headers) = headers {
            tables.push(HtmlTable { headers, rows });
        }
    }
    Ok(tables)
}

fn find_table<'a>(
    tables: &'a [HtmlTable],
    columns: &[&str],
    page: &str,
) -> Result<&'a HtmlTable, DataError> {
    tables.iter().find(|t| t.has_columns(columns)).ok_or_else(|| {
        DataError::ResponseFormatChanged(format!(
            "{page}: no table with columns {columns:?}"
        ))
    })
}

/// Tickers from the Nasdaq-100 components table (column `Ticker`).
pub fn parse_nasdaq_100(html: &str) -> Result<Vec<String>, DataError> {
    let tables = parse_tables(html)?;
    let table = find_table(&tables, &["Ticker"], "Nasdaq-100")?;
    let col = table.column("Ticker").unwrap_or(0);
    Ok(collect_column(table, col, |_| true))
}

/// Tickers from the S&P 500 constituents table in one GICS sector.
pub fn parse_sp500_sector(html: &str, sector: &str) -> Result<Vec<String>, DataError> {
    let tables = parse_tables(html)?;
    let table = find_table(&tables, &["Symbol", "GICS Sector"], "S&P 500")?;
    let symbol_col = table.column("Symbol").unwrap_or(0);
    let sector_col = table.column("GICS Sector").unwrap_or(0);
    Ok(collect_column(table, symbol_col, |row| {
        row.get(sector_col).is_some_and(|s| s == sector)
    }))
}

fn collect_column<F>(table: &HtmlTable, col: usize, keep: F) -> Vec<String>
where
    F: Fn(&[String]) -> bool,
{
    table
        .rows
        .iter()
        .filter(|row| keep(row))
        .filter_map(|row| row.get(col))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
