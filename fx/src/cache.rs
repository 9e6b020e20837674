//! Single-entry rate cache with TTL.
//!
//! The cache holds at most one table, tagged with the base it was fetched
//! for. The check-fetch-store sequence runs under one async mutex, so
//! concurrent misses result in a single fetch. A slow fetch therefore blocks
//! every other lookup on the same cache until it finishes.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use ratekit_common::{age, is_stale, now, Currency, Timestamp};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};
use crate::table::RateTable;

/// Cached table entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<RateTable>,
    base: Currency,
    fetched_at: Timestamp,
    using_fallback: bool,
}

impl CacheEntry {
    fn new(table: RateTable, base: Currency) -> Self {
        Self {
            table: Arc::new(table),
            base,
            fetched_at: now(),
            using_fallback: false,
        }
    }

    fn is_valid(&self, base: &Currency, ttl: Duration) -> bool {
        !self.table.is_empty() && self.base == *base && !is_stale(self.fetched_at, ttl)
    }
}

/// Thread-safe single-entry rate cache.
pub struct RateCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl RateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entry: Mutex::new(None),
        }
    }

    /// Return the cached table for `base`, fetching a fresh one if needed.
    ///
    /// On fetch failure the previous entry is left untouched and the error
    /// is returned. In offline mode `fetch` is never called: a table for
    /// `base` is served even past its TTL, and the entry is flagged as
    /// fallback data.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        base: &Currency,
        ttl: Duration,
        offline: bool,
        fetch: F,
    ) -> FxResult<Arc<RateTable>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FxResult<RateTable>>,
    {
        let mut guard = self.entry.lock().await;

        if let Some(entry) = guard.as_mut() {
            if entry.is_valid(base, ttl) {
                debug!(base = %base, "Cache hit");
                return Ok(entry.table.clone());
            }

            if offline && entry.base == *base && !entry.table.is_empty() {
                if !entry.using_fallback {
                    warn!(
                        base = %base,
                        age_secs = age(entry.fetched_at).num_seconds(),
                        "Offline mode, serving stale rates"
                    );
                }
                entry.using_fallback = true;
                return Ok(entry.table.clone());
            }
        }

        if offline {
            return Err(FxError::Offline { base: base.clone() });
        }

        debug!(base = %base, "Cache miss, fetching rates");
        let table = fetch().await?;
        let entry = CacheEntry::new(table, base.clone());
        let table = entry.table.clone();
        *guard = Some(entry);

        Ok(table)
    }

    /// Drop the cached entry.
    pub async fn clear(&self) {
        self.clear_with(|| ()).await;
    }

    /// Run `f` and drop the entry while holding the cache lock.
    ///
    /// Waits for any fetch in progress, so the fetched table is discarded
    /// rather than served after `f` has run.
    pub async fn clear_with<R>(&self, f: impl FnOnce() -> R) -> R {
        let mut guard = self.entry.lock().await;
        let result = f();
        *guard = None;
        result
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let guard = self.entry.lock().await;
        match guard.as_ref() {
            Some(entry) => CacheStats {
                base: Some(entry.base.clone()),
                entries: entry.table.len(),
                fetched_at: Some(entry.fetched_at),
                using_fallback: entry.using_fallback,
            },
            None => CacheStats::default(),
        }
    }

    /// Pretend the current entry was fetched `by` earlier.
    #[cfg(test)]
    pub(crate) async fn backdate(&self, by: Duration) {
        if let Some(entry) = self.entry.lock().await.as_mut() {
            entry.fetched_at = entry.fetched_at - by;
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub base: Option<Currency>,
    pub entries: usize,
    pub fetched_at: Option<Timestamp>,
    pub using_fallback: bool,
}
