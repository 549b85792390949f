// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Building a cache from a JSON configuration document.

use freshet::{Cache, CacheConfig};

const CONFIG: &str = r#"{
    "interval_secs": 300,
    "namespaces": [
        { "name": "student-list", "ttl_secs": 60, "stale_grace_secs": 30, "max_entries": 500 },
        { "name": "student-details", "ttl_secs": 600, "stale_grace_secs": 120 },
        { "name": "departments", "ttl_secs": 3600, "stale_grace_secs": 900, "max_entries": 200 }
    ]
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let config: CacheConfig = serde_json::from_str(CONFIG)?;
    let cache = Cache::<String>::from_config(&config)?;
    let maintenance = cache.maintenance().spawn();

    for name in cache.registry().names() {
        let namespace = cache.registry().config(&name)?;
        println!(
            "{name}: ttl {:?}, stale grace {:?}, up to {} entries",
            namespace.ttl(),
            namespace.stale_grace(),
            namespace.max_entries()
        );
    }

    maintenance.shutdown().await;
    Ok(())
}
