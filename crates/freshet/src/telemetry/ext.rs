// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Time helpers for telemetry recording.

use std::time::{Duration, Instant};

/// Returns the current instant from Tokio's clock.
///
/// Tokio's clock can be paused and advanced in tests, which drives every freshness decision in
/// the cache deterministically.
pub(crate) fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Result of a timed async operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedResult<R> {
    /// The result of the operation.
    pub result: R,
    /// The duration of the operation.
    pub duration: Duration,
}

/// Times an async operation and returns both the result and elapsed duration.
pub(crate) async fn timed<F, R>(f: F) -> TimedResult<R>
where
    F: Future<Output = R>,
{
    let start = now();
    let result = f.await;
    TimedResult {
        result,
        duration: now().saturating_duration_since(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timed_measures_paused_clock() {
        let timed = timed(async {
            tokio::time::advance(Duration::from_millis(100)).await;
            42
        })
        .await;

        assert_eq!(timed.result, 42);
        assert_eq!(timed.duration, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn now_follows_tokio_clock() {
        let before = now();
        tokio::time::advance(Duration::from_secs(70)).await;
        assert_eq!(now().duration_since(before), Duration::from_secs(70));
    }
}
