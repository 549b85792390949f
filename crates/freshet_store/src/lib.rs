// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Storage primitives for the `freshet` cache.
//!
//! This crate holds the policy-free half of the cache: [`CacheEntry`], which carries a value
//! with its freshness metadata, and [`EntryStore`], a bounded map of entries for one namespace.
//! Deciding when to load, refresh, or purge is left to `freshet`.
//!
//! # Overview
//!
//! ```
//! use freshet_store::{CacheEntry, EntryStore, Lookup};
//! use std::time::{Duration, Instant};
//!
//! let store = EntryStore::new(100);
//! let now = Instant::now();
//!
//! store.write("students_p1", CacheEntry::new("page one", now, Duration::from_secs(60), Duration::from_secs(30)));
//!
//! match store.lookup("students_p1", now) {
//!     Lookup::Fresh(entry) => assert_eq!(*entry.value(), "page one"),
//!     other => panic!("unexpected lookup result: {other:?}"),
//! }
//!
//! assert_eq!(store.remove_matching(|key| key.starts_with("students_")), 1);
//! ```

mod entry;
mod store;

#[doc(inline)]
pub use entry::{CacheEntry, Freshness};
#[doc(inline)]
pub use store::{Census, EntryStore, Lookup};
