// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Namespace configuration.

use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Default period between maintenance sweeps.
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Policy for one cache namespace.
///
/// A namespace is a logical partition of the cache with its own freshness window, stale grace
/// window, and size bound. Configurations are fixed once registered.
///
/// # Examples
///
/// ```
/// use freshet::NamespaceConfig;
/// use std::time::Duration;
///
/// let config = NamespaceConfig::new("student-list", Duration::from_secs(60))
///     .with_stale_grace(Duration::from_secs(30))
///     .with_max_entries(500);
///
/// assert_eq!(config.name(), "student-list");
/// assert_eq!(config.max_entries(), 500);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamespaceConfig {
    name: String,
    #[cfg_attr(feature = "serde", serde(rename = "ttl_secs", with = "secs"))]
    ttl: Duration,
    #[cfg_attr(feature = "serde", serde(rename = "stale_grace_secs", with = "secs", default))]
    stale_grace: Duration,
    #[cfg_attr(feature = "serde", serde(default = "default_max_entries"))]
    max_entries: usize,
}

impl NamespaceConfig {
    /// Creates a configuration with no stale grace window and a capacity of 1000 entries.
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            stale_grace: Duration::ZERO,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Frequently changing list and search results: one minute fresh, thirty seconds stale.
    pub fn volatile(name: impl Into<String>) -> Self {
        Self::new(name, Duration::from_secs(60))
            .with_stale_grace(Duration::from_secs(30))
            .with_max_entries(500)
    }

    /// Per-entity detail lookups: ten minutes fresh, two minutes stale.
    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name, Duration::from_secs(10 * 60))
            .with_stale_grace(Duration::from_secs(2 * 60))
            .with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Near-static reference data: an hour fresh, fifteen minutes stale.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(name, Duration::from_secs(60 * 60))
            .with_stale_grace(Duration::from_secs(15 * 60))
            .with_max_entries(200)
    }

    /// Sets how long an expired value may still be served while it is refreshed.
    #[must_use]
    pub fn with_stale_grace(mut self, stale_grace: Duration) -> Self {
        self.stale_grace = stale_grace;
        self
    }

    /// Sets the maximum number of entries kept for this namespace.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the freshness window.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stale grace window.
    #[must_use]
    pub fn stale_grace(&self) -> Duration {
        self.stale_grace
    }

    /// Returns the entry cap.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Checks that the name is non-empty, the ttl is positive and the capacity is at least one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.name.is_empty() {
            "name must not be empty"
        } else if self.ttl.is_zero() {
            "ttl must be greater than zero"
        } else if self.max_entries == 0 {
            "max_entries must be at least one"
        } else {
            return Ok(());
        };

        Err(Error::InvalidConfig {
            name: self.name.clone(),
            reason,
        })
    }
}

/// File-friendly description of a whole cache: its namespaces and maintenance cadence.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "serde")]
/// # fn main() {
/// use freshet::CacheConfig;
///
/// let config: CacheConfig = serde_json::from_str(r#"{
///     "interval_secs": 120,
///     "namespaces": [
///         { "name": "dashboard-stats", "ttl_secs": 300, "stale_grace_secs": 60 },
///         { "name": "departments", "ttl_secs": 3600, "max_entries": 50 }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(config.namespaces.len(), 2);
/// # }
/// # #[cfg(not(feature = "serde"))]
/// # fn main() {}
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheConfig {
    /// Namespaces to register at startup.
    pub namespaces: Vec<NamespaceConfig>,
    /// Period between maintenance sweeps.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "interval_secs", with = "secs", default = "default_interval")
    )]
    pub maintenance_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
        }
    }
}

#[cfg(feature = "serde")]
fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

#[cfg(feature = "serde")]
fn default_interval() -> Duration {
    DEFAULT_MAINTENANCE_INTERVAL
}

/// Durations as fractional seconds.
#[cfg(feature = "serde")]
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(de::Error::custom)
    }
}
