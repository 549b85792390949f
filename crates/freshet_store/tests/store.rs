// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `EntryStore`.

use std::time::{Duration, Instant};

use freshet_store::{CacheEntry, Census, EntryStore, Lookup};
use rstest::rstest;

const TTL: Duration = Duration::from_secs(60);
const GRACE: Duration = Duration::from_secs(30);

fn entry(value: i32, created_at: Instant) -> CacheEntry<i32> {
    CacheEntry::new(value, created_at, TTL, GRACE)
}

#[test]
fn read_missing_key_returns_none() {
    let store = EntryStore::<i32>::new(4);
    assert!(store.read("missing").is_none());
    assert!(store.is_empty());
}

#[test]
fn write_then_read_returns_copy() {
    let store = EntryStore::new(4);
    let now = Instant::now();
    store.write("key", entry(42, now));

    let read = store.read("key").expect("entry should exist");
    assert_eq!(*read.value(), 42);
    assert_eq!(store.len(), 1);
}

#[test]
fn read_has_no_side_effects() {
    let store = EntryStore::new(4);
    let now = Instant::now();
    store.write("key", entry(42, now));

    let _ = store.read("key");
    let _ = store.read("key");

    assert_eq!(store.read("key").expect("entry should exist").hit_count(), 0);
}

#[test]
fn lookup_classifies_and_counts_fresh_hits() {
    let store = EntryStore::new(4);
    let now = Instant::now();
    store.write("key", entry(7, now));

    let Lookup::Fresh(first) = store.lookup("key", now) else {
        panic!("expected a fresh lookup");
    };
    assert_eq!(first.hit_count(), 1);

    let Lookup::Fresh(second) = store.lookup("key", now + Duration::from_secs(1)) else {
        panic!("expected a fresh lookup");
    };
    assert_eq!(second.hit_count(), 2);
}

#[test]
fn lookup_stale_does_not_count_hit() {
    let store = EntryStore::new(4);
    let now = Instant::now();
    store.write("key", entry(7, now));

    let Lookup::Stale(stale) = store.lookup("key", now + TTL + Duration::from_secs(1)) else {
        panic!("expected a stale lookup");
    };
    assert_eq!(*stale.value(), 7);
    assert_eq!(stale.hit_count(), 0);
}

#[test]
fn lookup_expired_reads_as_missing() {
    let store = EntryStore::new(4);
    let now = Instant::now();
    store.write("key", entry(7, now));

    assert_eq!(store.lookup("key", now + TTL + GRACE), Lookup::Missing);
    assert_eq!(store.lookup("absent", now), Lookup::Missing);
}

#[test]
fn replacing_existing_key_never_evicts() {
    let store = EntryStore::new(2);
    let now = Instant::now();
    store.write("a", entry(1, now));
    store.write("b", entry(2, now));

    assert_eq!(store.write("a", entry(10, now + Duration::from_secs(1))), 0);
    assert_eq!(store.len(), 2);
    assert_eq!(*store.read("a").expect("entry should exist").value(), 10);
}

#[test]
fn full_store_evicts_oldest_before_insert() {
    let store = EntryStore::new(2);
    let now = Instant::now();
    store.write("p1", entry(1, now));
    store.write("p2", entry(2, now + Duration::from_secs(1)));

    let evicted = store.write("p3", entry(3, now + Duration::from_secs(2)));

    assert_eq!(evicted, 1);
    assert!(store.read("p1").is_none());
    assert!(store.read("p2").is_some());
    assert!(store.read("p3").is_some());
}

#[test]
fn eviction_breaks_ties_by_hit_count() {
    let store = EntryStore::new(2);
    let now = Instant::now();
    store.write("hot", entry(1, now));
    store.write("cold", entry(2, now));
    let _ = store.lookup("hot", now);

    store.write("new", entry(3, now + Duration::from_secs(1)));

    assert!(store.read("hot").is_some());
    assert!(store.read("cold").is_none());
}

#[test]
fn large_store_evicts_a_batch() {
    let store = EntryStore::new(20);
    let now = Instant::now();
    for i in 0..20 {
        store.write(format!("k{i}"), entry(i, now + Duration::from_secs(u64::try_from(i).expect("non-negative"))));
    }

    let evicted = store.write("overflow", entry(99, now + Duration::from_secs(100)));

    assert_eq!(evicted, 2);
    assert_eq!(store.len(), 19);
    assert!(store.read("k0").is_none());
    assert!(store.read("k1").is_none());
    assert!(store.read("k2").is_some());
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(7)]
#[case(50)]
fn store_never_exceeds_capacity(#[case] capacity: usize) {
    let store = EntryStore::new(capacity);
    let now = Instant::now();

    for i in 0..200_u64 {
        store.write(format!("key{}", i % 97), entry(0, now + Duration::from_millis(i)));
        assert!(store.len() <= capacity, "store grew to {} with capacity {capacity}", store.len());
    }
}

#[test]
fn remove_and_remove_matching() {
    let store = EntryStore::new(10);
    let now = Instant::now();
    store.write("students_p1", entry(1, now));
    store.write("students_p2", entry(2, now));
    store.write("faculties", entry(3, now));

    assert!(store.remove("faculties"));
    assert!(!store.remove("faculties"));

    assert_eq!(store.remove_matching(|key| key.starts_with("students_")), 2);
    assert!(store.is_empty());
}

#[test]
fn clear_reports_removed_count() {
    let store = EntryStore::new(10);
    let now = Instant::now();
    store.write("a", entry(1, now));
    store.write("b", entry(2, now));

    assert_eq!(store.clear(), 2);
    assert_eq!(store.clear(), 0);
}

#[test]
fn purge_expired_keeps_stale_entries() {
    let store = EntryStore::new(10);
    let now = Instant::now();
    store.write("old", entry(1, now));
    store.write("recent", entry(2, now + TTL));

    let later = now + TTL + GRACE;
    assert_eq!(store.purge_expired(later), 1);
    assert!(store.read("old").is_none());
    assert!(store.read("recent").is_some());
}

#[test]
fn census_counts_by_freshness() {
    let store = EntryStore::new(10);
    let now = Instant::now();
    store.write("expired", entry(1, now));
    store.write("stale", entry(2, now + GRACE));
    store.write("fresh", entry(3, now + TTL + GRACE));

    let census = store.census(now + TTL + GRACE);

    assert_eq!(
        census,
        Census {
            entries: 3,
            fresh: 1,
            stale: 1,
            expired: 1,
        }
    );
}

#[test]
fn keys_lists_stored_keys() {
    let store = EntryStore::new(10);
    let now = Instant::now();
    store.write("a", entry(1, now));
    store.write("b", entry(2, now));

    let mut keys = store.keys();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
}
