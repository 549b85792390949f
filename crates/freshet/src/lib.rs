// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! An in-process, namespaced read-through cache with stale-while-revalidate refreshing.
//!
//! Each namespace carries its own freshness window, stale grace window, and entry cap. Reads go
//! through [`Cache::get`] together with the loader that produces the value:
//!
//! - fresh entries are served directly;
//! - stale entries are served immediately while a single background refresh replaces them;
//! - missing or expired entries are loaded inline, with concurrent callers for the same key
//!   sharing one loader call.
//!
//! A [`Maintenance`] task purges entries nobody reads anymore and can keep critical keys warm.
//! Write paths describe what they make obsolete with [`Invalidation`]s, applied by
//! [`Cache::mutate`] only after the write succeeds.
//!
//! # Examples
//!
//! ```
//! use freshet::{Cache, NamespaceConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let cache = Cache::<String>::builder()
//!     .namespace(
//!         NamespaceConfig::new("student-details", Duration::from_secs(600))
//!             .with_stale_grace(Duration::from_secs(120))
//!             .with_max_entries(1000),
//!     )
//!     .build()?;
//!
//! let name = cache
//!     .get("student-details", "p1", || async { Ok::<_, anyhow::Error>("Ada".to_string()) })
//!     .await?;
//! assert_eq!(name, "Ada");
//!
//! let stats = cache.stats(Some("student-details"))?;
//! assert_eq!(stats.misses, 1);
//! assert_eq!(stats.entries, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `metrics`: records OpenTelemetry metrics through [`CacheBuilder::meter_provider`].
//! - `serde`: makes [`NamespaceConfig`] and [`CacheConfig`] deserializable, with durations in
//!   seconds.

pub mod builder;
pub mod cache;
mod config;
mod error;
mod invalidation;
pub mod maintenance;
mod refresh;
mod registry;
mod runtime;
mod stats;
mod telemetry;

#[doc(inline)]
pub use builder::CacheBuilder;
#[doc(inline)]
pub use cache::Cache;
pub use config::{CacheConfig, DEFAULT_MAINTENANCE_INTERVAL, NamespaceConfig};
pub use error::{Error, Result};
#[doc(inline)]
pub use freshet_store::{CacheEntry, Freshness};
pub use invalidation::{Invalidation, Mutation};
#[doc(inline)]
pub use maintenance::{BoxError, Maintenance, MaintenanceHandle, SweepReport};
pub use registry::NamespaceRegistry;
pub use runtime::{BoxedFuture, Spawner};
pub use stats::CacheStats;
pub use telemetry::CacheTelemetry;
