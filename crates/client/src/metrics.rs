//! Remote request metrics.
//!
//! Provides functions for recording per-endpoint latency and failures.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record the duration of one remote request.
pub fn record_request_duration(endpoint: &str, duration_secs: f64) {
    histogram!(
        "remote_request_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

/// Record a failed remote request.
pub fn record_request_failure(endpoint: &str) {
    counter!(
        "remote_request_failures_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// A helper to time remote calls and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = RequestTimer::new("attendance.check_in");
/// let result = request.send().await;
/// timer.finish(result.is_ok());
/// ```
pub struct RequestTimer {
    endpoint: String,
    start: Instant,
}

impl RequestTimer {
    /// Create a new timer for the given endpoint label.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration, and a failure when `succeeded` is false.
    pub fn finish(self, succeeded: bool) {
        record_request_duration(&self.endpoint, self.start.elapsed().as_secs_f64());
        if !succeeded {
            record_request_failure(&self.endpoint);
        }
    }
}
