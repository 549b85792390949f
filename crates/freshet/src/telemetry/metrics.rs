// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use opentelemetry::{
    InstrumentationScope, KeyValue,
    metrics::{Counter, Gauge, Histogram, Meter, MeterProvider},
};

use crate::telemetry::{CacheActivity, CacheOperation, attributes};

const METER_NAME: &str = "freshet";
const VERSION: &str = "v0.1.0";
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";
const CACHE_EVENT_COUNT_NAME: &str = "freshet.event.count";
const CACHE_LOAD_DURATION_NAME: &str = "freshet.load.duration";
const CACHE_SIZE_NAME: &str = "freshet.size";

pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}

#[derive(Clone, Debug)]
pub(crate) struct Instruments {
    event_counter: Counter<u64>,
    load_duration: Histogram<f64>,
    cache_size: Gauge<u64>,
}

impl Instruments {
    pub(crate) fn new(meter: &Meter) -> Self {
        Self {
            event_counter: meter
                .u64_counter(CACHE_EVENT_COUNT_NAME)
                .with_description("Cache events")
                .with_unit("{event}")
                .build(),
            load_duration: meter
                .f64_histogram(CACHE_LOAD_DURATION_NAME)
                .with_description("Duration of loader invocations")
                .with_unit("s")
                .build(),
            cache_size: meter
                .u64_gauge(CACHE_SIZE_NAME)
                .with_description("Number of entries in a cache namespace")
                .with_unit("{entry}")
                .build(),
        }
    }

    pub(crate) fn record(&self, namespace: &str, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
        let attrs = event_attributes(namespace, operation, activity);
        self.event_counter.add(1, &attrs);

        if let Some(duration) = duration {
            self.load_duration.record(duration.as_secs_f64(), &attrs);
        }
    }

    pub(crate) fn record_count(&self, namespace: &str, operation: CacheOperation, activity: CacheActivity, count: usize) {
        let attrs = event_attributes(namespace, operation, activity);
        self.event_counter.add(u64::try_from(count).unwrap_or(u64::MAX), &attrs);
    }

    pub(crate) fn record_size(&self, namespace: &str, size: usize) {
        let attrs = [KeyValue::new(attributes::CACHE_NAMESPACE, namespace.to_owned())];
        self.cache_size.record(u64::try_from(size).unwrap_or(u64::MAX), &attrs);
    }
}

fn event_attributes(namespace: &str, operation: CacheOperation, activity: CacheActivity) -> [KeyValue; 3] {
    [
        KeyValue::new(attributes::CACHE_NAMESPACE, namespace.to_owned()),
        KeyValue::new(attributes::CACHE_OPERATION, operation.as_str()),
        KeyValue::new(attributes::CACHE_ACTIVITY, activity.as_str()),
    ]
}
