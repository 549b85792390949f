// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Periodic sweeping and warm-up.
//!
//! Reads only replace entries, so keys nobody asks for again would linger past their stale grace
//! window. A [`Maintenance`] task removes them on an interval and can keep a fixed set of
//! critical keys loaded even without traffic.

use std::{fmt::Debug, sync::Arc, time::Duration};

use futures::{FutureExt, future::BoxFuture};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{
    Cache,
    telemetry::{CacheActivity, CacheOperation},
};

/// Error type produced by warm-up loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type WarmLoader<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, BoxError>> + Send + Sync>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct WarmTarget<V> {
    namespace: String,
    key: String,
    loader: WarmLoader<V>,
}

/// Outcome of one maintenance sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct SweepReport {
    /// Entries removed because their stale grace window had passed.
    pub purged: usize,
    /// Warm-up targets that now hold a value.
    pub warmed: usize,
    /// Warm-up targets whose loader failed.
    pub warm_failures: usize,
}

/// Builder and runner for cache maintenance.
///
/// Created by [`Cache::maintenance`].
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
///     .namespace(NamespaceConfig::volatile("dashboard-stats"))
///     .build()?;
///
/// let maintenance = cache
///     .maintenance()
///     .interval(Duration::from_secs(60))
///     .warm("dashboard-stats", "total-students", || async { Ok::<_, anyhow::Error>(1_250) });
///
/// let report = maintenance.run_once().await;
/// assert_eq!(report.warmed, 1);
///
/// let handle = maintenance.spawn();
/// handle.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[must_use = "maintenance does nothing unless run or spawned"]
pub struct Maintenance<V> {
    cache: Cache<V>,
    interval: Duration,
    targets: Vec<WarmTarget<V>>,
}

impl<V> Debug for Maintenance<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let targets: Vec<_> = self
            .targets
            .iter()
            .map(|target| (target.namespace.as_str(), target.key.as_str()))
            .collect();

        f.debug_struct("Maintenance")
            .field("interval", &self.interval)
            .field("targets", &targets)
            .finish_non_exhaustive()
    }
}

impl<V> Cache<V> {
    /// Creates a maintenance runner for this cache.
    ///
    /// The sweep period starts at the cache's configured maintenance interval, five minutes
    /// unless set through [`CacheBuilder::maintenance_interval`](crate::CacheBuilder::maintenance_interval)
    /// or [`CacheConfig`](crate::CacheConfig).
    pub fn maintenance(&self) -> Maintenance<V> {
        Maintenance {
            cache: self.clone(),
            interval: self.inner.maintenance_interval.max(MIN_INTERVAL),
            targets: Vec::new(),
        }
    }
}

impl<V> Maintenance<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Sets the period between sweeps. Periods shorter than a millisecond are rounded up.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Adds a key to load on every sweep.
    ///
    /// The loader is called through [`Cache::get`], so a fresh entry is left alone and a stale
    /// one is refreshed in the background.
    pub fn warm<F, Fut, E>(mut self, namespace: impl Into<String>, key: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.targets.push(WarmTarget {
            namespace: namespace.into(),
            key: key.into(),
            loader: Arc::new(move || {
                loader()
                    .map(|result| result.map_err(|error| -> BoxError { error.into() }))
                    .boxed()
            }),
        });
        self
    }

    /// Runs a single sweep: purges expired entries in every namespace, then visits every warm-up
    /// target. A failing target is logged and counted; the remaining targets still run.
    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport {
            purged: self.cache.purge_expired(),
            ..SweepReport::default()
        };

        for target in &self.targets {
            let loader = Arc::clone(&target.loader);
            match self.cache.get(&target.namespace, &target.key, move || loader()).await {
                Ok(_) => report.warmed += 1,
                Err(error) => {
                    report.warm_failures += 1;
                    self.cache.inner.telemetry.record_failure(
                        &target.namespace,
                        CacheOperation::Warm,
                        CacheActivity::WarmFailed,
                        &error,
                    );
                }
            }
        }

        report
    }

    /// Starts sweeping on the ambient Tokio runtime.
    ///
    /// The first sweep runs one interval after spawning. A sweep that overruns the interval
    /// delays the next one instead of triggering a burst.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(self) -> MaintenanceHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let report = self.run_once().await;
                tracing::debug!(
                    purged = report.purged,
                    warmed = report.warmed,
                    warm_failures = report.warm_failures,
                    "cache.sweep_completed"
                );
            }
        });

        MaintenanceHandle { task }
    }
}

/// Handle to a spawned maintenance task. Dropping it stops the task.
#[derive(Debug)]
#[must_use = "dropping the handle stops maintenance"]
pub struct MaintenanceHandle {
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Stops the task and waits until it has finished.
    pub async fn shutdown(mut self) {
        self.task.abort();
        // Cancellation is the expected outcome.
        let _ = (&mut self.task).await;
    }

    /// Returns `true` once the task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
