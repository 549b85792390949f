// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache handle: stale-while-revalidate reads with deduplicated loading.

use std::{fmt::Display, sync::Arc, time::Duration};

use freshet_store::{CacheEntry, Freshness, Lookup};

use crate::{
    CacheConfig, Error, NamespaceConfig, NamespaceRegistry, Result,
    builder::CacheBuilder,
    refresh::{Claim, RefreshTicket},
    registry::Namespace,
    runtime::Spawner,
    stats::{CacheStats, Counter},
    telemetry::{
        CacheActivity, CacheOperation, CacheTelemetry,
        ext::{now, timed},
    },
};

#[derive(Debug)]
pub(crate) struct CacheInner<V> {
    pub(crate) registry: NamespaceRegistry<V>,
    pub(crate) spawner: Spawner,
    pub(crate) telemetry: CacheTelemetry,
    pub(crate) maintenance_interval: Duration,
}

/// A namespaced read-through cache with stale-while-revalidate semantics.
///
/// `Cache` is a cheap handle; clones share the same namespaces and entries.
///
/// Reads go through [`get`](Self::get), which takes the key's loader:
///
/// - a **fresh** entry is returned without calling the loader;
/// - a **stale** entry is returned immediately and the loader runs in the background, unless a
///   load for the same key is already running;
/// - otherwise the loader runs inline and its value is stored. A failed load stores nothing.
///
/// At most one loader per `(namespace, key)` runs at any time. Concurrent misses for the same key
/// wait for the running load and then read its result.
///
/// # Examples
///
/// ```
/// use freshet::{Cache, NamespaceConfig};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let cache = Cache::<u64>::builder()
///     .namespace(NamespaceConfig::new("dashboard-stats", Duration::from_secs(300)))
///     .build()?;
///
/// let total = cache
///     .get("dashboard-stats", "total-students", || async { Ok::<_, anyhow::Error>(1_250) })
///     .await?;
/// assert_eq!(total, 1_250);
///
/// // Served from the cache; this loader is never called.
/// let again = cache
///     .get("dashboard-stats", "total-students", || async { Err::<u64, _>(anyhow::anyhow!("not called")) })
///     .await?;
/// assert_eq!(again, 1_250);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Cache<V> {
    pub(crate) inner: Arc<CacheInner<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Cache<V> {
    /// Creates a builder for a cache.
    #[must_use]
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }

    /// Returns the namespace registry backing this cache.
    #[must_use]
    pub fn registry(&self) -> &NamespaceRegistry<V> {
        &self.inner.registry
    }

    /// Registers an additional namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateNamespace`] or [`Error::InvalidConfig`].
    pub fn register(&self, config: NamespaceConfig) -> Result<()> {
        self.inner.registry.register(config)
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache with every namespace of `config` registered and a Tokio spawner.
    ///
    /// The configured maintenance interval becomes the default of [`maintenance`](Self::maintenance).
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::builder()
            .namespaces(config.namespaces.iter().cloned())
            .maintenance_interval(config.maintenance_interval)
            .build()
    }

    /// Returns the cached value for `key`, loading it with `loader` when needed.
    ///
    /// The loader's error type is also the error type of this call. Loader errors are returned
    /// unchanged on a synchronous miss; [`Error::UnknownNamespace`] is converted with `From`.
    /// A loader dispatched as a background refresh reports failures only through logs and
    /// [`stats`](Self::stats), and the stale entry stays servable until its grace window ends.
    /// With the default Tokio spawner, a stale read made outside a Tokio runtime skips the
    /// refresh and records it as a refresh failure.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if a synchronous load fails, or the converted
    /// [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub async fn get<F, Fut, E>(&self, namespace: &str, key: &str, loader: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: From<Error> + Display + Send + 'static,
    {
        let ns = self.inner.registry.resolve(namespace)?;
        let telemetry = &self.inner.telemetry;
        let mut recorded_miss = false;

        loop {
            match ns.store.lookup(key, now()) {
                Lookup::Fresh(entry) => {
                    ns.counters.increment(Counter::Hit);
                    telemetry.record(&ns.name, CacheOperation::Get, CacheActivity::Hit, None);
                    return Ok(entry.into_value());
                }
                Lookup::Stale(entry) => {
                    ns.counters.increment(Counter::StaleHit);
                    telemetry.record(&ns.name, CacheOperation::Get, CacheActivity::StaleHit, None);
                    self.refresh_in_background(&ns, key, loader);
                    return Ok(entry.into_value());
                }
                Lookup::Missing => {
                    if !recorded_miss {
                        recorded_miss = true;
                        ns.counters.increment(Counter::Miss);
                        telemetry.record(&ns.name, CacheOperation::Get, CacheActivity::Miss, None);
                    }
                }
            }

            match ns.in_flight.try_claim(&ns.name, key) {
                Claim::Acquired(ticket) => {
                    // A previous holder may have stored a value between the lookup and the claim.
                    if ns.store.read(key).is_some_and(|entry| entry.freshness(now()) != Freshness::Expired) {
                        drop(ticket);
                        continue;
                    }
                    return self.load(&ns, ticket, loader).await;
                }
                Claim::Busy(waiter) => waiter.released().await,
            }
        }
    }

    async fn load<F, Fut, E>(&self, ns: &Namespace<V>, ticket: RefreshTicket, loader: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: Display,
    {
        let telemetry = &self.inner.telemetry;
        let timed = timed(loader()).await;

        match timed.result {
            Ok(value) => {
                ns.insert(ticket.key(), value.clone(), telemetry, CacheOperation::Get);
                drop(ticket);
                ns.counters.increment(Counter::Load);
                telemetry.record(&ns.name, CacheOperation::Get, CacheActivity::Loaded, Some(timed.duration));
                Ok(value)
            }
            Err(error) => {
                drop(ticket);
                ns.counters.increment(Counter::LoadFailure);
                telemetry.record_failure(&ns.name, CacheOperation::Get, CacheActivity::LoadFailed, &error);
                Err(error)
            }
        }
    }

    fn refresh_in_background<F, Fut, E>(&self, ns: &Arc<Namespace<V>>, key: &str, loader: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let Claim::Acquired(ticket) = ns.in_flight.try_claim(&ns.name, key) else {
            return;
        };

        let telemetry = self.inner.telemetry.clone();
        telemetry.record(&ns.name, CacheOperation::Refresh, CacheActivity::RefreshStarted, None);

        let task_ns = Arc::clone(ns);
        let task_telemetry = telemetry.clone();
        let spawned = self.inner.spawner.spawn(async move {
            let (ns, telemetry) = (task_ns, task_telemetry);
            let timed = timed(loader()).await;

            match timed.result {
                Ok(value) => {
                    ns.insert(ticket.key(), value, &telemetry, CacheOperation::Refresh);
                    ns.counters.increment(Counter::Refresh);
                    telemetry.record(&ns.name, CacheOperation::Refresh, CacheActivity::Refreshed, Some(timed.duration));
                }
                Err(error) => {
                    ns.counters.increment(Counter::RefreshFailure);
                    telemetry.record_failure(ticket.namespace(), CacheOperation::Refresh, CacheActivity::RefreshFailed, &error);
                }
            }

            drop(ticket);
        });

        if !spawned {
            ns.counters.increment(Counter::RefreshFailure);
            telemetry.record_failure(&ns.name, CacheOperation::Refresh, CacheActivity::RefreshFailed, &"no Tokio runtime to run the refresh on");
        }
    }

    /// Stores `value` as a freshly computed entry, exactly as a successful load would.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn set(&self, namespace: &str, key: &str, value: V) -> Result<()> {
        let ns = self.inner.registry.resolve(namespace)?;
        ns.insert(key, value, &self.inner.telemetry, CacheOperation::Insert);
        self.inner
            .telemetry
            .record(&ns.name, CacheOperation::Insert, CacheActivity::Inserted, None);
        Ok(())
    }

    /// Returns the value for `key` if it is fresh or stale, without loading, refreshing, or
    /// counting a hit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn peek(&self, namespace: &str, key: &str) -> Result<Option<V>> {
        let ns = self.inner.registry.resolve(namespace)?;
        Ok(ns
            .store
            .read(key)
            .filter(|entry| entry.freshness(now()) != Freshness::Expired)
            .map(CacheEntry::into_value))
    }

    /// Returns `true` if `key` holds a fresh or stale value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn contains(&self, namespace: &str, key: &str) -> Result<bool> {
        self.peek(namespace, key).map(|value| value.is_some())
    }

    /// Returns the freshness of the entry for `key`, or `None` if there is no entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn freshness(&self, namespace: &str, key: &str) -> Result<Option<Freshness>> {
        let ns = self.inner.registry.resolve(namespace)?;
        Ok(ns.store.read(key).map(|entry| entry.freshness(now())))
    }
}

impl<V> Cache<V> {
    /// Forgets the entry for `key` so the next read is a miss.
    ///
    /// Running refreshes are not awaited; one that completes afterwards stores its newer value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn invalidate(&self, namespace: &str, key: &str) -> Result<bool> {
        let ns = self.inner.registry.resolve(namespace)?;
        let removed = ns.store.remove(key);
        if removed {
            self.inner
                .telemetry
                .record(&ns.name, CacheOperation::Invalidate, CacheActivity::Invalidated, None);
        }
        Ok(removed)
    }

    /// Forgets every entry of a namespace and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn invalidate_namespace(&self, namespace: &str) -> Result<usize> {
        let ns = self.inner.registry.resolve(namespace)?;
        let removed = ns.store.clear();
        self.inner
            .telemetry
            .record_batch(&ns.name, CacheOperation::Invalidate, CacheActivity::Invalidated, removed);
        Ok(removed)
    }

    /// Forgets every entry whose key matches `predicate` and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn invalidate_matching(&self, namespace: &str, predicate: impl FnMut(&str) -> bool) -> Result<usize> {
        let ns = self.inner.registry.resolve(namespace)?;
        let removed = ns.store.remove_matching(predicate);
        self.inner
            .telemetry
            .record_batch(&ns.name, CacheOperation::Invalidate, CacheActivity::Invalidated, removed);
        Ok(removed)
    }

    /// Forgets every entry whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn invalidate_prefix(&self, namespace: &str, prefix: &str) -> Result<usize> {
        self.invalidate_matching(namespace, |key| key.starts_with(prefix))
    }

    /// Returns statistics for one namespace, or aggregated over all namespaces with `None`.
    ///
    /// Has no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if a named namespace is not registered.
    pub fn stats(&self, namespace: Option<&str>) -> Result<CacheStats> {
        match namespace {
            Some(name) => Ok(self.inner.registry.resolve(name)?.stats()),
            None => Ok(self
                .inner
                .registry
                .all()
                .iter()
                .map(|ns| ns.stats())
                .fold(CacheStats::default(), CacheStats::merge)),
        }
    }

    /// Returns the number of loaders currently running for a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn refreshes_in_flight(&self, namespace: &str) -> Result<usize> {
        Ok(self.inner.registry.resolve(namespace)?.in_flight.len())
    }

    /// Returns `true` while a loader for `key` is running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if `namespace` is not registered.
    pub fn is_loading(&self, namespace: &str, key: &str) -> Result<bool> {
        Ok(self.inner.registry.resolve(namespace)?.in_flight.is_in_flight(key))
    }

    /// Removes entries that are past their stale grace window in every namespace.
    ///
    /// Returns the number of removed entries.
    pub fn purge_expired(&self) -> usize {
        let telemetry = &self.inner.telemetry;
        let at = now();

        self.inner
            .registry
            .all()
            .iter()
            .map(|ns| {
                let purged = ns.store.purge_expired(at);
                ns.counters.add(Counter::Purge, purged);
                telemetry.record_batch(&ns.name, CacheOperation::Sweep, CacheActivity::Purged, purged);
                telemetry.record_size(&ns.name, ns.store.len());
                purged
            })
            .sum()
    }
}

impl<V> Namespace<V>
where
    V: Clone,
{
    /// Writes a new entry created now, recording any evictions it caused.
    fn insert(&self, key: &str, value: V, telemetry: &CacheTelemetry, operation: CacheOperation) {
        let entry = CacheEntry::new(value, now(), self.config.ttl(), self.config.stale_grace());
        let evicted = self.store.write(key, entry);

        self.counters.add(Counter::Eviction, evicted);
        telemetry.record_batch(&self.name, operation, CacheActivity::Evicted, evicted);
        telemetry.record_size(&self.name, self.store.len());
    }
}
