//! Metrics and observability utilities
//!
//! Prometheus-style metrics with standardized naming. The recorder is
//! installed by the binary; these helpers only emit.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PDF Intellect metrics
pub const METRICS_PREFIX: &str = "pdfintellect";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
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
    10.00,  // 10s
    30.00,  // 30s - provider timeout
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
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

    // Provider metrics
    describe_counter!(
        format!("{}_llm_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "External model attempts by provider and outcome"
    );

    describe_histogram!(
        format!("{}_llm_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "External model call latency in seconds"
    );

    describe_counter!(
        format!("{}_local_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Requests answered by the local engine"
    );

    // Document metrics
    describe_counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        Unit::Count,
        "Total PDFs uploaded"
    );

    describe_histogram!(
        format!("{}_extraction_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "PDF text extraction latency in seconds"
    );

    describe_histogram!(
        format!("{}_extraction_pages", METRICS_PREFIX),
        Unit::Count,
        "Pages per extracted document"
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

/// Helper to record one external model attempt
pub fn record_llm_attempt(provider: &str, capability: &str, outcome: &str, duration_secs: f64) {
    counter!(
        format!("{}_llm_attempts_total", METRICS_PREFIX),
        "provider" => provider.to_string(),
        "capability" => capability.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_llm_duration_seconds", METRICS_PREFIX),
        "provider" => provider.to_string()
    )
    .record(duration_secs);
}

/// Helper to record a local-engine answer
pub fn record_fallback(capability: &str, reason: &str) {
    counter!(
        format!("{}_local_fallbacks_total", METRICS_PREFIX),
        "capability" => capability.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Helper to record extraction metrics
pub fn record_extraction(duration_secs: f64, pages: usize, extractable: bool) {
    let status = if extractable { "text" } else { "placeholder" };

    histogram!(
        format!("{}_extraction_duration_seconds", METRICS_PREFIX),
        "status" => status
    )
    .record(duration_secs);

    histogram!(format!("{}_extraction_pages", METRICS_PREFIX)).record(pages as f64);
}

/// Helper to record an accepted upload
pub fn record_upload(bytes: usize) {
    counter!(format!("{}_uploads_total", METRICS_PREFIX)).increment(1);
    tracing::debug!(bytes, "Upload recorded");
}
