// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for cache statistics.

use std::time::Duration;

use freshet::{Cache, Error, NamespaceConfig};

fn cache() -> Cache<u32> {
    Cache::builder()
        .namespace(
            NamespaceConfig::new("students", Duration::from_secs(60))
                .with_stale_grace(Duration::from_secs(30))
                .with_max_entries(10),
        )
        .namespace(NamespaceConfig::reference("departments"))
        .build()
        .unwrap()
}

async fn get(cache: &Cache<u32>, namespace: &str, key: &str, value: u32) -> u32 {
    cache
        .get(namespace, key, move || async move { Ok::<_, anyhow::Error>(value) })
        .await
        .unwrap()
}

#[tokio::test]
async fn empty_cache_reports_zero_hit_rate() {
    let stats = cache().stats(None).unwrap();

    assert_eq!(stats.entries, 0);
    assert!(stats.hit_rate().abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn counts_entries_by_freshness() {
    let cache = cache();
    cache.set("students", "expired", 1).unwrap();
    tokio::time::advance(Duration::from_secs(40)).await;
    cache.set("students", "stale", 2).unwrap();
    tokio::time::advance(Duration::from_secs(60)).await;
    cache.set("students", "fresh", 3).unwrap();

    let stats = cache.stats(Some("students")).unwrap();

    assert_eq!(stats.entries, 3);
    assert_eq!(stats.fresh_count, 1);
    assert_eq!(stats.stale_count, 1);
    assert_eq!(stats.expired_count, 1);
}

#[tokio::test(start_paused = true)]
async fn hit_rate_counts_fresh_and_stale_hits() {
    let cache = cache();

    get(&cache, "students", "p1", 1).await; // miss
    get(&cache, "students", "p1", 1).await; // hit
    tokio::time::advance(Duration::from_secs(70)).await;
    get(&cache, "students", "p1", 2).await; // stale hit
    get(&cache, "students", "p2", 1).await; // miss

    let stats = cache.stats(Some("students")).unwrap();

    assert_eq!(stats.hits, 1);
    assert_eq!(stats.stale_hits, 1);
    assert_eq!(stats.misses, 2);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn aggregate_sums_every_namespace() {
    let cache = cache();
    get(&cache, "students", "p1", 1).await;
    get(&cache, "departments", "cs", 1).await;
    get(&cache, "departments", "cs", 1).await;

    let total = cache.stats(None).unwrap();

    assert_eq!(total.entries, 2);
    assert_eq!(total.misses, 2);
    assert_eq!(total.hits, 1);
    assert_eq!(total.loads, 2);
}

#[tokio::test]
async fn stats_have_no_side_effects() {
    let cache = cache();
    get(&cache, "students", "p1", 1).await;

    let first = cache.stats(Some("students")).unwrap();
    let second = cache.stats(Some("students")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn unknown_namespace_is_an_error() {
    assert_eq!(
        cache().stats(Some("faculties")),
        Err(Error::UnknownNamespace("faculties".into()))
    );
}
