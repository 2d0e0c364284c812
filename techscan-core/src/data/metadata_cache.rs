//! On-disk TTL caches for slow-changing metadata.
//!
//! Layout under `{cache_dir}`:
//! - `universe.json`: the last fetched universe (default TTL 24 h)
//! - `companies.json`: ticker → company name (default TTL 7 days per entry)
//!
//! Writes are atomic (write to .tmp, rename into place). An unreadable cache
//! file is treated as a miss, never as an error.

use super::provider::{DataError, MarketDataProvider};
use super::universe::{Universe, UniverseSource};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A cached value with the time it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cached<T> {
    pub cached_at: DateTime<Utc>,
    pub value: T,
}

impl<T> Cached<T> {
    pub fn new(value: T, now: DateTime<Utc>) -> Self {
        Self {
            cached_at: now,
            value,
        }
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.cached_at < ttl
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable cache file");
            None
        }
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| DataError::CacheError(format!("serialization: {e}")))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)
        .map_err(|e| DataError::CacheError(format!("write {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::CacheError(format!("atomic rename failed: {e}"))
    })
}

/// Universe cache backed by `universe.json`.
pub struct UniverseCache {
    path: PathBuf,
    ttl: Duration,
}

impl UniverseCache {
    pub fn new(cache_dir: impl AsRef<Path>, ttl: Duration) -> Self {
        Self {
            path: cache_dir.as_ref().join("universe.json"),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached universe if present and younger than the TTL.
    pub fn load_fresh(&self, now: DateTime<Utc>) -> Option<Universe> {
        let cached: Cached<Universe> = read_json(&self.path)?;
        if cached.is_fresh(self.ttl, now) && !cached.value.is_empty() {
            Some(cached.value)
        } else {
            None
        }
    }

    pub fn store(&self, universe: &Universe, now: DateTime<Utc>) -> Result<(), DataError> {
        write_json_atomic(&self.path, &Cached::new(universe, now))
    }

    /// Return the cached universe, or fetch from `source` and cache it.
    ///
    /// `refresh` skips the cache lookup. A failing source is fatal; a failing
    /// cache write is only logged.
    pub fn get_or_fetch(
        &self,
        source: &dyn UniverseSource,
        refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<Universe, DataError> {
        if !refresh {
            if let Some(universe) = self.load_fresh(now) {
                debug!(tickers = universe.ticker_count(), "universe cache hit");
                return Ok(universe);
            }
        }

        let universe = source.fetch()?;
        if universe.is_empty() {
            return Err(DataError::ResponseFormatChanged(format!(
                "{} returned an empty universe",
                source.name()
            )));
        }
        info!(
            source = source.name(),
            tickers = universe.ticker_count(),
            "universe refreshed"
        );
        if let Err(e) = self.store(&universe, now) {
            warn!(error = %e, "could not cache universe");
        }
        Ok(universe)
    }
}

/// Company name lookup with a per-entry TTL.
pub struct CompanyNames {
    path: Option<PathBuf>,
    ttl: Duration,
    entries: BTreeMap<String, Cached<String>>,
    dirty: bool,
}

impl CompanyNames {
    /// Open `companies.json` under `cache_dir` (missing file = empty cache).
    pub fn open(cache_dir: impl AsRef<Path>, ttl: Duration) -> Self {
        let path = cache_dir.as_ref().join("companies.json");
        let entries: BTreeMap<String, Cached<String>> = read_json(&path).unwrap_or_default();
        Self {
            path: Some(path),
            ttl,
            entries,
            dirty: false,
        }
    }

    /// A cache that never touches the filesystem.
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            path: None,
            ttl,
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_fresh(&self, ticker: &str, now: DateTime<Utc>) -> Option<&str> {
        self.entries
            .get(ticker)
            .filter(|c| c.is_fresh(self.ttl, now))
            .map(|c| c.value.as_str())
    }

    pub fn insert(&mut self, ticker: &str, name: String, now: DateTime<Utc>) {
        self.entries
            .insert(ticker.to_string(), Cached::new(name, now));
        self.dirty = true;
    }

    /// Company name for `ticker`, asking the provider on a cache miss.
    ///
    /// Falls back to the ticker itself when the provider fails or has no name.
    /// Fallbacks are not cached, so the next run asks again.
    pub fn resolve(
        &mut self,
        provider: &dyn MarketDataProvider,
        ticker: &str,
        now: DateTime<Utc>,
    ) -> String {
        if let Some(name) = self.get_fresh(ticker, now) {
            return name.to_string();
        }
        match provider.fetch_company_name(ticker) {
            Ok(Some(name)) => {
                self.insert(ticker, name.clone(), now);
                name
            }
            Ok(None) => ticker.to_string(),
            Err(e) => {
                debug!(ticker, error = %e, "company name lookup failed");
                ticker.to_string()
            }
        }
    }

    /// Persist new entries. No-op for in-memory caches or when nothing changed.
    pub fn save(&mut self) -> Result<(), DataError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        write_json_atomic(path, &self.entries)?;
        self.dirty = false;
        Ok(())
    }
}
