// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bounded key to entry storage for a single namespace.

use std::{collections::HashMap, time::Instant};

use parking_lot::Mutex;

use crate::{CacheEntry, Freshness};

/// Fraction of the capacity evicted at once when a full store admits a new key.
const EVICTION_BATCH_DIVISOR: usize = 10;

/// Result of an atomic [`EntryStore::lookup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<V> {
    /// The entry is fresh; its hit counter was incremented.
    Fresh(CacheEntry<V>),
    /// The entry is stale but still servable.
    Stale(CacheEntry<V>),
    /// No entry exists, or the existing one is past its stale grace window.
    Missing,
}

/// Entry counts by freshness, taken under a single lock acquisition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Census {
    /// Total number of stored entries.
    pub entries: usize,
    /// Entries within their time-to-live.
    pub fresh: usize,
    /// Entries inside their stale grace window.
    pub stale: usize,
    /// Entries no longer servable that were not yet purged.
    pub expired: usize,
}

/// Storage for the entries of one namespace.
///
/// All mutation is serialized by one mutex per store. Critical sections never await and never
/// call back into user code, so the lock is only held for map bookkeeping.
///
/// When a write would exceed `max_entries`, the store first evicts a batch of entries chosen by
/// oldest `created_at`, with ties broken by the lowest hit count. The batch is a tenth of the
/// capacity (at least one entry), which amortizes eviction under sustained pressure.
///
/// # Examples
///
/// ```
/// use freshet_store::{CacheEntry, EntryStore};
/// use std::time::{Duration, Instant};
///
/// let store = EntryStore::new(2);
/// let now = Instant::now();
/// let ttl = Duration::from_secs(60);
///
/// store.write("a", CacheEntry::new(1, now, ttl, Duration::ZERO));
/// store.write("b", CacheEntry::new(2, now + Duration::from_secs(1), ttl, Duration::ZERO));
/// let evicted = store.write("c", CacheEntry::new(3, now + Duration::from_secs(2), ttl, Duration::ZERO));
///
/// assert_eq!(evicted, 1);
/// assert!(store.read("a").is_none());
/// assert_eq!(store.len(), 2);
/// ```
#[derive(Debug)]
pub struct EntryStore<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    max_entries: usize,
}

impl<V> EntryStore<V> {
    /// Creates an empty store holding at most `max_entries` entries.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Returns the capacity of this store.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns the number of stored entries, including ones that are no longer servable.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns the keys currently stored, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Removes the entry for `key`. Returns `true` if an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Removes every entry whose key matches `predicate` and returns how many were removed.
    pub fn remove_matching(&self, mut predicate: impl FnMut(&str) -> bool) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    /// Removes every entry and returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Removes every entry that is past its stale grace window at `now`.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.freshness(now) != Freshness::Expired);
        before - entries.len()
    }

    /// Counts stored entries by freshness at `now`.
    #[must_use]
    pub fn census(&self, now: Instant) -> Census {
        let entries = self.entries.lock();
        let mut census = Census {
            entries: entries.len(),
            ..Census::default()
        };

        for entry in entries.values() {
            match entry.freshness(now) {
                Freshness::Fresh => census.fresh += 1,
                Freshness::Stale => census.stale += 1,
                Freshness::Expired => census.expired += 1,
            }
        }

        census
    }

    fn eviction_batch(&self) -> usize {
        (self.max_entries / EVICTION_BATCH_DIVISOR).max(1)
    }
}

impl<V: Clone> EntryStore<V> {
    /// Returns a copy of the entry for `key`, whatever its freshness. Has no side effects.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.lock().get(key).cloned()
    }

    /// Reads and classifies the entry for `key` at `now` in one critical section.
    ///
    /// A fresh entry has its hit counter incremented before the copy is taken.
    pub fn lookup(&self, key: &str, now: Instant) -> Lookup<V> {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return Lookup::Missing;
        };

        match entry.freshness(now) {
            Freshness::Fresh => {
                entry.record_hit();
                Lookup::Fresh(entry.clone())
            }
            Freshness::Stale => Lookup::Stale(entry.clone()),
            Freshness::Expired => Lookup::Missing,
        }
    }

    /// Stores `entry` under `key` and returns how many other entries were evicted to make room.
    ///
    /// Replacing an existing key never evicts. The store never holds more than
    /// [`max_entries`](Self::max_entries) entries once this returns.
    pub fn write(&self, key: impl Into<String>, entry: CacheEntry<V>) -> usize {
        let key = key.into();
        let mut entries = self.entries.lock();

        let evicted = if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let overflow = entries.len() + 1 - self.max_entries;
            let count = self.eviction_batch().max(overflow);
            evict_oldest(&mut entries, count)
        } else {
            0
        };

        entries.insert(key, entry);
        evicted
    }
}

fn evict_oldest<V>(entries: &mut HashMap<String, CacheEntry<V>>, count: usize) -> usize {
    let mut candidates: Vec<(Instant, u64, String)> = entries
        .iter()
        .map(|(key, entry)| (entry.created_at(), entry.hit_count(), key.clone()))
        .collect();

    let count = count.min(candidates.len());
    if count == 0 {
        return 0;
    }

    if count < candidates.len() {
        candidates.select_nth_unstable(count - 1);
    }

    for (_, _, key) in candidates.into_iter().take(count) {
        entries.remove(&key);
    }

    count
}
