// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for invalidation and declared mutations.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use freshet::{Cache, Error, Invalidation, Mutation, NamespaceConfig};

fn cache() -> Cache<String> {
    Cache::builder()
        .namespace(NamespaceConfig::entity("student-details"))
        .namespace(NamespaceConfig::volatile("student-list"))
        .namespace(NamespaceConfig::volatile("dashboard-stats"))
        .build()
        .unwrap()
}

async fn load(cache: &Cache<String>, namespace: &str, key: &str, calls: &Arc<AtomicUsize>) -> String {
    let calls = Arc::clone(calls);
    let value = format!("{namespace}/{key}");
    cache
        .get(namespace, key, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(value)
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn invalidated_key_is_a_miss_next_time() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    load(&cache, "student-details", "p1", &calls).await;
    load(&cache, "student-details", "p1", &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(cache.invalidate("student-details", "p1").unwrap());
    assert!(!cache.invalidate("student-details", "p1").unwrap());

    load(&cache, "student-details", "p1", &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.stats(Some("student-details")).unwrap().misses, 2);
}

#[tokio::test]
async fn namespace_and_prefix_invalidation() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    for key in ["students_page_1", "students_page_2", "students_search_ada", "summary"] {
        load(&cache, "student-list", key, &calls).await;
    }
    load(&cache, "dashboard-stats", "total", &calls).await;

    assert_eq!(cache.invalidate_prefix("student-list", "students_page_").unwrap(), 2);
    assert_eq!(cache.invalidate_matching("student-list", |key| key.contains("ada")).unwrap(), 1);
    assert!(cache.contains("student-list", "summary").unwrap());

    assert_eq!(cache.invalidate_namespace("student-list").unwrap(), 1);
    assert_eq!(cache.stats(Some("student-list")).unwrap().entries, 0);
    assert!(cache.contains("dashboard-stats", "total").unwrap());
}

#[tokio::test(start_paused = true)]
async fn refresh_completing_after_invalidation_repopulates() {
    let cache = cache();
    cache.set("student-list", "summary", "old".into()).unwrap();
    tokio::time::advance(Duration::from_secs(70)).await;

    let served = cache
        .get("student-list", "summary", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, anyhow::Error>("refreshed".to_string())
        })
        .await
        .unwrap();
    assert_eq!(served, "old");

    assert!(cache.invalidate("student-list", "summary").unwrap());
    assert!(!cache.contains("student-list", "summary").unwrap());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(cache.peek("student-list", "summary").unwrap().as_deref(), Some("refreshed"));
}

struct EnrollStudent {
    id: &'static str,
    fail: bool,
    writes: Arc<AtomicUsize>,
}

impl EnrollStudent {
    fn new(id: &'static str, fail: bool) -> Self {
        Self {
            id,
            fail,
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Mutation for EnrollStudent {
    type Output = &'static str;
    type Error = anyhow::Error;

    fn invalidations(&self) -> Vec<Invalidation> {
        vec![
            Invalidation::key("student-details", self.id),
            Invalidation::prefix("student-list", "students_"),
            Invalidation::namespace("dashboard-stats"),
        ]
    }

    async fn apply(self) -> anyhow::Result<&'static str> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("constraint violation");
        }
        Ok(self.id)
    }
}

#[tokio::test]
async fn successful_mutation_applies_declared_invalidations() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    load(&cache, "student-details", "p1", &calls).await;
    load(&cache, "student-list", "students_page_1", &calls).await;
    load(&cache, "student-list", "summary", &calls).await;
    load(&cache, "dashboard-stats", "total", &calls).await;

    let id = cache.mutate(EnrollStudent::new("p1", false)).await.unwrap();

    assert_eq!(id, "p1");
    assert!(!cache.contains("student-details", "p1").unwrap());
    assert!(!cache.contains("student-list", "students_page_1").unwrap());
    assert!(cache.contains("student-list", "summary").unwrap());
    assert_eq!(cache.stats(Some("dashboard-stats")).unwrap().entries, 0);
}

#[tokio::test]
async fn failed_mutation_leaves_the_cache_alone() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    load(&cache, "student-details", "p1", &calls).await;

    let error = cache.mutate(EnrollStudent::new("p1", true)).await.unwrap_err();

    assert_eq!(error.to_string(), "constraint violation");
    assert!(cache.contains("student-details", "p1").unwrap());
}

#[tokio::test]
async fn mutation_targeting_an_unknown_namespace_never_writes() {
    let cache = Cache::<String>::builder()
        .namespace(NamespaceConfig::entity("student-details"))
        .build()
        .unwrap();
    cache.set("student-details", "p1", "old".into()).unwrap();
    let mutation = EnrollStudent::new("p1", false);
    let writes = Arc::clone(&mutation.writes);

    let error = cache.mutate(mutation).await.unwrap_err();

    assert_eq!(
        error.downcast_ref::<Error>(),
        Some(&Error::UnknownNamespace("student-list".into()))
    );
    assert_eq!(writes.load(Ordering::SeqCst), 0);
    assert_eq!(cache.peek("student-details", "p1").unwrap().as_deref(), Some("old"));
}
