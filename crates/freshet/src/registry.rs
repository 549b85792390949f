// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The namespace registry: configuration and storage for every namespace.

use std::{collections::HashMap, sync::Arc};

use freshet_store::EntryStore;
use parking_lot::RwLock;

use crate::{
    Error, NamespaceConfig, Result,
    refresh::InFlight,
    stats::{CacheStats, Counters},
    telemetry::ext::now,
};

/// Everything the cache keeps for one namespace.
///
/// Each namespace owns its own store, ticket table and counters, so operations on different
/// namespaces never contend once the namespace has been resolved.
#[derive(Debug)]
pub(crate) struct Namespace<V> {
    pub(crate) name: Arc<str>,
    pub(crate) config: NamespaceConfig,
    pub(crate) store: EntryStore<V>,
    pub(crate) in_flight: InFlight,
    pub(crate) counters: Counters,
}

impl<V> Namespace<V> {
    fn new(config: NamespaceConfig) -> Self {
        Self {
            name: Arc::from(config.name()),
            store: EntryStore::new(config.max_entries()),
            in_flight: InFlight::default(),
            counters: Counters::default(),
            config,
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.store.census(now()), self.in_flight.len())
    }
}

/// Maps namespace names to their configuration and storage.
///
/// Namespaces are normally registered once at startup. [`deregister`](Self::deregister) exists
/// for test setup and teardown.
///
/// # Examples
///
/// ```
/// use freshet::{Error, NamespaceConfig, NamespaceRegistry};
///
/// let registry = NamespaceRegistry::<String>::new();
/// registry.register(NamespaceConfig::reference("departments"))?;
///
/// assert_eq!(registry.config("departments")?.name(), "departments");
/// assert!(matches!(
///     registry.register(NamespaceConfig::reference("departments")),
///     Err(Error::DuplicateNamespace(_))
/// ));
/// # Ok::<(), Error>(())
/// ```
#[derive(Debug)]
pub struct NamespaceRegistry<V> {
    namespaces: RwLock<HashMap<String, Arc<Namespace<V>>>>,
}

impl<V> Default for NamespaceRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> NamespaceRegistry<V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a namespace and creates its store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration does not validate and
    /// [`Error::DuplicateNamespace`] if the name is taken.
    pub fn register(&self, config: NamespaceConfig) -> Result<()> {
        config.validate()?;

        let mut namespaces = self.namespaces.write();
        if namespaces.contains_key(config.name()) {
            return Err(Error::DuplicateNamespace(config.name().to_owned()));
        }

        tracing::debug!(
            cache.namespace = config.name(),
            ttl_ms = config.ttl().as_millis(),
            stale_grace_ms = config.stale_grace().as_millis(),
            max_entries = config.max_entries(),
            "cache.namespace_registered"
        );
        namespaces.insert(config.name().to_owned(), Arc::new(Namespace::new(config)));
        Ok(())
    }

    /// Removes a namespace together with all of its entries.
    ///
    /// Background refreshes already running for the namespace complete against the detached
    /// store and are then discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if the name is not registered.
    pub fn deregister(&self, name: &str) -> Result<NamespaceConfig> {
        self.namespaces
            .write()
            .remove(name)
            .map(|namespace| namespace.config.clone())
            .ok_or_else(|| Error::UnknownNamespace(name.to_owned()))
    }

    /// Returns the configuration of a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNamespace`] if the name is not registered.
    pub fn config(&self, name: &str) -> Result<NamespaceConfig> {
        self.resolve(name).map(|namespace| namespace.config.clone())
    }

    /// Returns the registered namespace names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.read().len()
    }

    /// Returns `true` if no namespace is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.read().is_empty()
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<Arc<Namespace<V>>> {
        self.namespaces
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownNamespace(name.to_owned()))
    }

    pub(crate) fn all(&self) -> Vec<Arc<Namespace<V>>> {
        self.namespaces.read().values().cloned().collect()
    }
}
