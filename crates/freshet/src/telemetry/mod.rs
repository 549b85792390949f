// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logging and optional OpenTelemetry metrics for cache activity.
//!
//! Every activity is emitted as a `tracing` event whose level follows
//! [`CacheActivity::level`]. With the `metrics` feature and a configured meter provider, the
//! same activities are also counted, and loader durations and namespace sizes are recorded.

use std::time::Duration;

use tracing::Level;

pub(crate) mod attributes;
pub(crate) mod ext;
#[cfg(feature = "metrics")]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

/// Telemetry sink shared by all namespaces of a cache.
#[derive(Clone, Debug, Default)]
pub struct CacheTelemetry {
    #[cfg(feature = "metrics")]
    instruments: Option<metrics::Instruments>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    Refresh,
    Insert,
    Invalidate,
    Sweep,
    Warm,
}

impl CacheOperation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Refresh => "cache.refresh",
            Self::Insert => "cache.insert",
            Self::Invalidate => "cache.invalidate",
            Self::Sweep => "cache.sweep",
            Self::Warm => "cache.warm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    StaleHit,
    Miss,
    Loaded,
    LoadFailed,
    RefreshStarted,
    Refreshed,
    RefreshFailed,
    Inserted,
    Invalidated,
    Evicted,
    Purged,
    WarmFailed,
}

impl CacheActivity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::StaleHit => "cache.stale_hit",
            Self::Miss => "cache.miss",
            Self::Loaded => "cache.loaded",
            Self::LoadFailed => "cache.load_failed",
            Self::RefreshStarted => "cache.refresh_started",
            Self::Refreshed => "cache.refreshed",
            Self::RefreshFailed => "cache.refresh_failed",
            Self::Inserted => "cache.inserted",
            Self::Invalidated => "cache.invalidated",
            Self::Evicted => "cache.evicted",
            Self::Purged => "cache.purged",
            Self::WarmFailed => "cache.warm_failed",
        }
    }

    pub(crate) fn level(self) -> Level {
        match self {
            Self::Hit | Self::StaleHit | Self::Miss | Self::Loaded | Self::Inserted => Level::DEBUG,
            Self::RefreshStarted | Self::Refreshed | Self::Invalidated | Self::Evicted | Self::Purged => Level::INFO,
            // Failures on the synchronous path already reach the caller as errors.
            Self::LoadFailed => Level::INFO,
            Self::RefreshFailed | Self::WarmFailed => Level::WARN,
        }
    }
}

impl CacheTelemetry {
    /// Creates a telemetry sink that only logs through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a telemetry sink that also records OpenTelemetry metrics.
    #[cfg(feature = "metrics")]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn with_meter_provider(provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        Self {
            instruments: Some(metrics::Instruments::new(&metrics::create_meter(provider))),
        }
    }

    #[cfg_attr(not(feature = "metrics"), expect(unused_variables, reason = "duration is only recorded as a metric"))]
    pub(crate) fn record(&self, namespace: &str, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
        #[cfg(feature = "metrics")]
        if let Some(instruments) = &self.instruments {
            instruments.record(namespace, operation, activity, duration);
        }

        emit(namespace, operation, activity, 1, None);
    }

    /// Records an activity that affected `count` entries at once, such as an eviction batch.
    pub(crate) fn record_batch(&self, namespace: &str, operation: CacheOperation, activity: CacheActivity, count: usize) {
        if count == 0 {
            return;
        }

        #[cfg(feature = "metrics")]
        if let Some(instruments) = &self.instruments {
            instruments.record_count(namespace, operation, activity, count);
        }

        emit(namespace, operation, activity, count, None);
    }

    /// Records a failed loader, keeping its message in the log line.
    pub(crate) fn record_failure(&self, namespace: &str, operation: CacheOperation, activity: CacheActivity, error: &dyn std::fmt::Display) {
        #[cfg(feature = "metrics")]
        if let Some(instruments) = &self.instruments {
            instruments.record(namespace, operation, activity, None);
        }

        emit(namespace, operation, activity, 1, Some(error));
    }

    #[cfg_attr(not(feature = "metrics"), expect(unused_variables, reason = "size is only recorded as a metric"))]
    pub(crate) fn record_size(&self, namespace: &str, size: usize) {
        #[cfg(feature = "metrics")]
        if let Some(instruments) = &self.instruments {
            instruments.record_size(namespace, size);
        }
    }
}

fn emit(namespace: &str, operation: CacheOperation, activity: CacheActivity, count: usize, error: Option<&dyn std::fmt::Display>) {
    let op = operation.as_str();
    let act = activity.as_str();
    let error = error.map(tracing::field::display);

    // Tracing levels must be constant, so the level is selected by a macro arm.
    // Field names must match constants in attributes.rs.
    macro_rules! emit_event {
        ($level:ident) => {
            tracing::$level!(
                cache.namespace = namespace,
                cache.operation = op,
                cache.activity = act,
                cache.count = count,
                error = error,
                "cache.event"
            )
        };
    }

    let level = activity.level();
    if level == Level::ERROR {
        emit_event!(error);
    } else if level == Level::WARN {
        emit_event!(warn);
    } else if level == Level::INFO {
        emit_event!(info);
    } else {
        emit_event!(debug);
    }
}
