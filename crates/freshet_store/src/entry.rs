// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    ops::Deref,
    time::{Duration, Instant},
};

/// How usable an entry is at a given instant.
///
/// | State     | Condition                          | Read path behavior              |
/// |-----------|------------------------------------|---------------------------------|
/// | `Fresh`   | `now < expires_at`                 | served, no I/O                  |
/// | `Stale`   | `expires_at <= now < stale_until`  | served, refreshed in background |
/// | `Expired` | `now >= stale_until`               | treated as absent               |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// The entry is within its time-to-live.
    Fresh,
    /// The entry outlived its time-to-live but is still inside the stale grace window.
    Stale,
    /// The entry is no longer usable, not even as a fallback.
    Expired,
}

/// A cached value together with its freshness metadata.
///
/// The timestamps always satisfy `created_at <= expires_at <= stale_until`; the only
/// constructor derives them from a creation instant and two non-negative durations.
///
/// # Examples
///
/// ```
/// use freshet_store::{CacheEntry, Freshness};
/// use std::time::{Duration, Instant};
///
/// let now = Instant::now();
/// let entry = CacheEntry::new(42, now, Duration::from_secs(60), Duration::from_secs(30));
///
/// assert_eq!(*entry.value(), 42);
/// assert_eq!(entry.freshness(now), Freshness::Fresh);
/// assert_eq!(entry.freshness(now + Duration::from_secs(70)), Freshness::Stale);
/// assert_eq!(entry.freshness(now + Duration::from_secs(90)), Freshness::Expired);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    expires_at: Instant,
    stale_until: Instant,
    hit_count: u64,
}

impl<V> CacheEntry<V> {
    /// Creates an entry computed at `created_at`.
    ///
    /// `expires_at` is `created_at + ttl` and `stale_until` is `expires_at + stale_grace`.
    /// Additions that would overflow the platform's `Instant` range saturate at the
    /// previous bound, so the ordering invariant still holds.
    pub fn new(value: V, created_at: Instant, ttl: Duration, stale_grace: Duration) -> Self {
        let expires_at = created_at.checked_add(ttl).unwrap_or(created_at);
        let stale_until = expires_at.checked_add(stale_grace).unwrap_or(expires_at);

        Self {
            value,
            created_at,
            expires_at,
            stale_until,
            hit_count: 0,
        }
    }

    /// Classifies the entry at `now`.
    #[must_use]
    pub fn freshness(&self, now: Instant) -> Freshness {
        if now < self.expires_at {
            Freshness::Fresh
        } else if now < self.stale_until {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    /// Returns how long ago the value was computed.
    #[must_use]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Returns the instant the value was computed.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns the end of the freshness window.
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns the end of the stale grace window.
    #[must_use]
    pub fn stale_until(&self) -> Instant {
        self.stale_until
    }

    /// Returns how many fresh reads this entry served.
    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub(crate) fn record_hit(&mut self) {
        self.hit_count = self.hit_count.saturating_add(1);
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry and returns the inner value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V> Deref for CacheEntry<V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
