// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Introspection counters and snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use freshet_store::Census;

/// Activity counters for one namespace. Updated with relaxed atomics; they are diagnostics,
/// not synchronization.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
    evictions: AtomicU64,
    purged: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Counter {
    Hit,
    StaleHit,
    Miss,
    Load,
    LoadFailure,
    Refresh,
    RefreshFailure,
    Eviction,
    Purge,
}

impl Counters {
    pub(crate) fn add(&self, counter: Counter, amount: usize) {
        let amount = u64::try_from(amount).unwrap_or(u64::MAX);
        let cell = match counter {
            Counter::Hit => &self.hits,
            Counter::StaleHit => &self.stale_hits,
            Counter::Miss => &self.misses,
            Counter::Load => &self.loads,
            Counter::LoadFailure => &self.load_failures,
            Counter::Refresh => &self.refreshes,
            Counter::RefreshFailure => &self.refresh_failures,
            Counter::Eviction => &self.evictions,
            Counter::Purge => &self.purged,
        };
        cell.fetch_add(amount, Ordering::Relaxed);
    }

    pub(crate) fn increment(&self, counter: Counter) {
        self.add(counter, 1);
    }

    pub(crate) fn snapshot(&self, census: Census, in_flight: usize) -> CacheStats {
        CacheStats {
            entries: census.entries,
            fresh_count: census.fresh,
            stale_count: census.stale,
            expired_count: census.expired,
            in_flight,
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time statistics for one namespace or for the whole cache.
///
/// Entry counts come from a census of the store; the remaining fields are cumulative since the
/// namespace was registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct CacheStats {
    /// Stored entries, whatever their freshness.
    pub entries: usize,
    /// Entries within their time-to-live.
    pub fresh_count: usize,
    /// Entries inside their stale grace window.
    pub stale_count: usize,
    /// Entries past their stale grace window that maintenance has not purged yet.
    pub expired_count: usize,
    /// Loaders currently running.
    pub in_flight: usize,
    /// Reads served from fresh entries.
    pub hits: u64,
    /// Reads served from stale entries.
    pub stale_hits: u64,
    /// Reads that found no servable entry.
    pub misses: u64,
    /// Successful synchronous loads.
    pub loads: u64,
    /// Failed synchronous loads.
    pub load_failures: u64,
    /// Successful background refreshes.
    pub refreshes: u64,
    /// Failed background refreshes.
    pub refresh_failures: u64,
    /// Entries evicted to respect the size bound.
    pub evictions: u64,
    /// Entries removed by maintenance sweeps.
    pub purged: u64,
}

impl CacheStats {
    /// Fraction of reads served from the cache, fresh or stale.
    ///
    /// Returns `0.0` when no reads were recorded.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "ratio of counters, precision loss is irrelevant")]
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let lookups = served + self.misses;
        if lookups == 0 {
            0.0
        } else {
            served as f64 / lookups as f64
        }
    }

    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            entries: self.entries + other.entries,
            fresh_count: self.fresh_count + other.fresh_count,
            stale_count: self.stale_count + other.stale_count,
            expired_count: self.expired_count + other.expired_count,
            in_flight: self.in_flight + other.in_flight,
            hits: self.hits + other.hits,
            stale_hits: self.stale_hits + other.stale_hits,
            misses: self.misses + other.misses,
            loads: self.loads + other.loads,
            load_failures: self.load_failures + other.load_failures,
            refreshes: self.refreshes + other.refreshes,
            refresh_failures: self.refresh_failures + other.refresh_failures,
            evictions: self.evictions + other.evictions,
            purged: self.purged + other.purged,
        }
    }
}
