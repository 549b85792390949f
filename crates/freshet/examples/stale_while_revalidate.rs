// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Stale-while-revalidate: an expired value is served instantly while one background load
//! replaces it.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use freshet::{Cache, NamespaceConfig};

#[derive(Clone, Debug, Default)]
struct StudentDirectory {
    queries: Arc<AtomicU32>,
}

impl StudentDirectory {
    async fn count(&self) -> anyhow::Result<u32> {
        let version = self.queries.fetch_add(1, Ordering::Relaxed) + 1;
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(1_000 + version)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let cache = Cache::<u32>::builder()
        .namespace(
            NamespaceConfig::new("dashboard-stats", Duration::from_secs(1))
                .with_stale_grace(Duration::from_secs(5)),
        )
        .build()?;
    let directory = StudentDirectory::default();

    let read = |cache: Cache<u32>, directory: StudentDirectory| async move {
        cache
            .get("dashboard-stats", "total-students", move || async move { directory.count().await })
            .await
    };

    println!("cold read:  {}", read(cache.clone(), directory.clone()).await?);
    println!("fresh read: {}", read(cache.clone(), directory.clone()).await?);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    println!("stale read: {} (served immediately)", read(cache.clone(), directory.clone()).await?);

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("after refresh: {}", read(cache.clone(), directory.clone()).await?);

    println!("queries issued: {}", directory.queries.load(Ordering::Relaxed));
    println!("{:#?}", cache.stats(Some("dashboard-stats"))?);
    Ok(())
}
