// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Many concurrent misses for the same key share a single loader call.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use freshet::{Cache, NamespaceConfig};
use futures::future::join_all;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let cache = Cache::<Vec<String>>::builder()
        .namespace(NamespaceConfig::volatile("student-list"))
        .build()?;
    let queries = Arc::new(AtomicU32::new(0));

    let readers = (0..100).map(|_| {
        let cache = cache.clone();
        let queries = Arc::clone(&queries);
        tokio::spawn(async move {
            cache
                .get("student-list", "students_page_1", move || async move {
                    queries.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok::<_, anyhow::Error>(vec!["Ada".to_string(), "Grace".to_string()])
                })
                .await
        })
    });

    for result in join_all(readers).await {
        assert_eq!(result??.len(), 2);
    }

    println!("100 readers, {} database queries", queries.load(Ordering::Relaxed));
    Ok(())
}
