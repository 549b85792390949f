// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`Cache`].

use std::{marker::PhantomData, sync::Arc, time::Duration};

use crate::{
    Cache, NamespaceConfig, NamespaceRegistry, Result,
    cache::CacheInner,
    config::DEFAULT_MAINTENANCE_INTERVAL,
    runtime::Spawner,
    telemetry::CacheTelemetry,
};

/// Builder for constructing a [`Cache`].
///
/// Created by [`Cache::builder`]. Namespaces are validated and registered when
/// [`build`](Self::build) is called.
///
/// # Examples
///
/// ```
/// use freshet::{Cache, NamespaceConfig, Spawner};
///
/// let cache = Cache::<String>::builder()
///     .namespace(NamespaceConfig::entity("students"))
///     .namespace(NamespaceConfig::reference("departments"))
///     .spawner(Spawner::new_tokio())
///     .build()?;
///
/// assert_eq!(cache.registry().names(), ["departments", "students"]);
/// # Ok::<(), freshet::Error>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing unless built"]
pub struct CacheBuilder<V> {
    namespaces: Vec<NamespaceConfig>,
    spawner: Spawner,
    telemetry: CacheTelemetry,
    maintenance_interval: Duration,
    _value: PhantomData<fn() -> V>,
}

impl<V> Default for CacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheBuilder<V> {
    pub(crate) fn new() -> Self {
        Self {
            namespaces: Vec::new(),
            spawner: Spawner::default(),
            telemetry: CacheTelemetry::default(),
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
            _value: PhantomData,
        }
    }

    /// Adds a namespace.
    pub fn namespace(mut self, config: NamespaceConfig) -> Self {
        self.namespaces.push(config);
        self
    }

    /// Adds several namespaces.
    pub fn namespaces(mut self, configs: impl IntoIterator<Item = NamespaceConfig>) -> Self {
        self.namespaces.extend(configs);
        self
    }

    /// Sets the spawner used for background refreshes. Defaults to Tokio.
    pub fn spawner(mut self, spawner: Spawner) -> Self {
        self.spawner = spawner;
        self
    }

    /// Sets the telemetry sink.
    pub fn telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Sets the default sweep period for [`Cache::maintenance`]. Defaults to five minutes.
    pub fn maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    /// Records OpenTelemetry metrics through `provider`.
    #[cfg(feature = "metrics")]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    pub fn meter_provider(self, provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        self.telemetry(CacheTelemetry::with_meter_provider(provider))
    }

    /// Builds the cache.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::InvalidConfig`](crate::Error::InvalidConfig) or
    /// [`Error::DuplicateNamespace`](crate::Error::DuplicateNamespace) among the namespaces.
    pub fn build(self) -> Result<Cache<V>> {
        let registry = NamespaceRegistry::new();
        for config in self.namespaces {
            registry.register(config)?;
        }

        Ok(Cache {
            inner: Arc::new(CacheInner {
                registry,
                spawner: self.spawner,
                telemetry: self.telemetry,
                maintenance_interval: self.maintenance_interval,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn build_registers_every_namespace() {
        let cache = CacheBuilder::<i32>::new()
            .namespace(NamespaceConfig::volatile("dashboard-stats"))
            .namespaces([NamespaceConfig::entity("students"), NamespaceConfig::reference("departments")])
            .build()
            .unwrap();

        assert_eq!(cache.registry().len(), 3);
    }

    #[test]
    fn build_rejects_duplicates() {
        let result = CacheBuilder::<i32>::new()
            .namespace(NamespaceConfig::entity("students"))
            .namespace(NamespaceConfig::volatile("students"))
            .build();

        assert_eq!(result.unwrap_err(), Error::DuplicateNamespace("students".into()));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let result = CacheBuilder::<i32>::new()
            .namespace(NamespaceConfig::new("broken", Duration::ZERO))
            .build();

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn empty_builder_builds() {
        let cache = CacheBuilder::<i32>::default().build().unwrap();
        assert!(cache.registry().is_empty());
    }
}
