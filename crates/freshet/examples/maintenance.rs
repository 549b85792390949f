// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Periodic purging of abandoned entries and warm-up of critical keys.

use std::time::Duration;

use freshet::{Cache, NamespaceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let cache = Cache::<String>::builder()
        .namespace(NamespaceConfig::new("search", Duration::from_millis(200)))
        .namespace(NamespaceConfig::reference("departments"))
        .build()?;

    for query in ["ada", "grace", "linus"] {
        cache.set("search", query, format!("results for {query}"))?;
    }

    let handle = cache
        .maintenance()
        .interval(Duration::from_millis(500))
        .warm("departments", "all", || async {
            Ok::<_, anyhow::Error>("Computer Science, Mathematics".to_string())
        })
        .warm("departments", "archived", || async {
            Err::<String, _>(anyhow::anyhow!("archive database unavailable"))
        })
        .spawn();

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    handle.shutdown().await;

    let stats = cache.stats(None)?;
    println!("purged: {}, entries left: {}", stats.purged, stats.entries);
    println!("departments/all: {:?}", cache.peek("departments", "all")?);
    Ok(())
}
