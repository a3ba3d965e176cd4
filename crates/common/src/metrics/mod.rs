//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming. Writes are counted per
//! entity, operation and outcome; notifications carry their own counters and
//! latency histogram because they run against a remote service.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all DrugReg metrics
pub const METRICS_PREFIX: &str = "drugreg";

/// Histogram buckets for request and storage latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Buckets for notification latency, capped by the notifier timeout
pub const NOTIFY_BUCKETS: &[f64] = &[
    0.010,
    0.050,
    0.100,
    0.250,
    0.500,
    1.000,
    2.000,
    3.000,
    5.000,
];

/// Outcome label for a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Ok,
    Invalid,
    Conflict,
    NotFound,
    Error,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Ok => "ok",
            WriteOutcome::Invalid => "invalid",
            WriteOutcome::Conflict => "conflict",
            WriteOutcome::NotFound => "not_found",
            WriteOutcome::Error => "error",
        }
    }

    /// Classify a write result
    pub fn of<T>(result: &crate::Result<T>) -> Self {
        use crate::AppError;
        match result {
            Ok(_) => WriteOutcome::Ok,
            Err(AppError::Validation { .. } | AppError::MalformedInput { .. }) => WriteOutcome::Invalid,
            Err(AppError::AlreadyExists { .. } | AppError::InvalidReference { .. }) => WriteOutcome::Conflict,
            Err(AppError::NotFound { .. }) => WriteOutcome::NotFound,
            Err(_) => WriteOutcome::Error,
        }
    }
}

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_writes_total", METRICS_PREFIX),
        Unit::Count,
        "Entity writes by entity, operation and outcome"
    );

    describe_histogram!(
        format!("{}_write_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Entity write latency in seconds"
    );

    describe_counter!(
        format!("{}_notifications_total", METRICS_PREFIX),
        Unit::Count,
        "Cross-service notifications by outcome"
    );

    describe_histogram!(
        format!("{}_notification_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Cross-service notification latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Tracks one repository write from start to outcome
pub struct WriteTimer {
    start: Instant,
    entity: &'static str,
    operation: &'static str,
}

impl WriteTimer {
    pub fn start(entity: &'static str, operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            entity,
            operation,
        }
    }

    /// Record the write and hand the result back unchanged
    pub fn finish<T>(self, result: crate::Result<T>) -> crate::Result<T> {
        let outcome = WriteOutcome::of(&result);
        record_write(self.entity, self.operation, outcome, self.start.elapsed().as_secs_f64());
        result
    }
}

/// Helper to record write metrics
pub fn record_write(entity: &str, operation: &str, outcome: WriteOutcome, duration_secs: f64) {
    counter!(
        format!("{}_writes_total", METRICS_PREFIX),
        "entity" => entity.to_string(),
        "operation" => operation.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        format!("{}_write_duration_seconds", METRICS_PREFIX),
        "entity" => entity.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Helper to record notification metrics
pub fn record_notification(duration_secs: f64, confirmed: bool) {
    let outcome = if confirmed { "confirmed" } else { "unconfirmed" };

    counter!(
        format!("{}_notifications_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(format!("{}_notification_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;

    #[test]
    fn test_buckets_sorted() {
        for buckets in [LATENCY_BUCKETS, NOTIFY_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
        // Default notifier timeout falls on a bucket boundary
        assert!(NOTIFY_BUCKETS.contains(&3.0));
    }

    #[test]
    fn test_write_outcome_classification() {
        let ok: crate::Result<()> = Ok(());
        assert_eq!(WriteOutcome::of(&ok), WriteOutcome::Ok);

        let dup: crate::Result<()> = Err(AppError::AlreadyExists {
            entity: "ingredient".into(),
            key: "name".into(),
        });
        assert_eq!(WriteOutcome::of(&dup), WriteOutcome::Conflict);

        let missing: crate::Result<()> = Err(AppError::not_found("batch", 9));
        assert_eq!(WriteOutcome::of(&missing).as_str(), "not_found");
    }

    #[test]
    fn test_write_timer_passes_result_through() {
        let timer = WriteTimer::start("drug", "create");
        let result = timer.finish(Ok::<_, AppError>(5));
        assert_eq!(result.unwrap(), 5);
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("GET", "/v1/drugs");
        metrics.finish(200);
    }
}
