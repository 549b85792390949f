// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Exporting cache activity as OpenTelemetry metrics.

use freshet::{Cache, NamespaceConfig};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let exporter = InMemoryMetricExporter::default();
    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(exporter.clone())
        .build();

    let cache = Cache::<u32>::builder()
        .namespace(NamespaceConfig::entity("student-details"))
        .meter_provider(&meter_provider)
        .build()?;

    for _ in 0..3 {
        cache
            .get("student-details", "p1", || async { Ok::<_, anyhow::Error>(42) })
            .await?;
    }

    meter_provider.force_flush()?;
    for resource in exporter.get_finished_metrics()? {
        for scope in resource.scope_metrics() {
            for metric in scope.metrics() {
                println!("{}: {}", metric.name(), metric.description());
            }
        }
    }
    Ok(())
}
