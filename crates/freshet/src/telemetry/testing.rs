// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test utilities for telemetry validation.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// Test helper for collecting and asserting on `OTel` metrics.
#[cfg(feature = "metrics")]
#[derive(Debug)]
pub(crate) struct MetricTester {
    exporter: opentelemetry_sdk::metrics::InMemoryMetricExporter,
    provider: opentelemetry_sdk::metrics::SdkMeterProvider,
}

#[cfg(feature = "metrics")]
impl MetricTester {
    #[must_use]
    pub fn new() -> Self {
        let in_memory = opentelemetry_sdk::metrics::InMemoryMetricExporter::default();

        Self {
            exporter: in_memory.clone(),
            provider: opentelemetry_sdk::metrics::SdkMeterProvider::builder()
                .with_periodic_exporter(in_memory)
                .build(),
        }
    }

    #[must_use]
    pub fn meter_provider(&self) -> &opentelemetry_sdk::metrics::SdkMeterProvider {
        &self.provider
    }

    #[must_use]
    pub fn collect_attributes(&self) -> Vec<opentelemetry::KeyValue> {
        use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData, ResourceMetrics, ScopeMetrics};

        self.provider.force_flush().unwrap();

        let mut attributes = Vec::new();
        for resource in self.exporter.get_finished_metrics().unwrap() {
            for metric in ResourceMetrics::scope_metrics(&resource).flat_map(ScopeMetrics::metrics) {
                match metric.data() {
                    AggregatedMetrics::U64(MetricData::Sum(data)) => {
                        attributes.extend(data.data_points().flat_map(|point| point.attributes().cloned()));
                    }
                    AggregatedMetrics::U64(MetricData::Gauge(data)) => {
                        attributes.extend(data.data_points().flat_map(|point| point.attributes().cloned()));
                    }
                    AggregatedMetrics::F64(MetricData::Histogram(data)) => {
                        attributes.extend(data.data_points().flat_map(|point| point.attributes().cloned()));
                    }
                    _ => {}
                }
            }
        }
        attributes
    }

    pub fn assert_attributes_contain(&self, key_values: &[opentelemetry::KeyValue]) {
        let attributes = self.collect_attributes();

        for attr in key_values {
            assert!(
                attributes.contains(attr),
                "attribute {attr:?} not found in collected attributes: {attributes:?}"
            );
        }
    }
}

/// Log capture buffer for testing.
///
/// Uses `tracing_subscriber::fmt::MakeWriter` to capture formatted log output
/// into a shared buffer that can be inspected in tests.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the captured log output as a string.
    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
    }

    /// Asserts that the captured log output contains the given string.
    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(
            output.contains(expected),
            "log output does not contain '{expected}', got:\n{output}"
        );
    }

    /// Creates a `tracing_subscriber` that writes to this capture buffer at every level.
    /// Use with `set_default()` for thread-local capture.
    #[must_use]
    pub fn subscriber(&self) -> impl tracing::Subscriber {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish()
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Writer that appends to a shared buffer.
pub(crate) struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
