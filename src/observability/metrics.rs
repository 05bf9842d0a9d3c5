//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, status, route
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Unmatched requests are labelled with route `none`
//! - Histogram buckets tuned for typical web latencies

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

pub const METRIC_REQUESTS_TOTAL: &str = "http_requests_total";
pub const METRIC_REQUEST_DURATION: &str = "http_request_duration_seconds";

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(METRIC_REQUEST_DURATION.to_string()),
            LATENCY_BUCKETS,
        )?
        .with_http_listener(addr)
        .install()?;

    tracing::info!(address = %addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let status = status.to_string();
    metrics::counter!(METRIC_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.clone(),
        "route" => route.to_string(),
    )
    .increment(1);
    metrics::histogram!(METRIC_REQUEST_DURATION,
        "method" => method.to_string(),
        "status" => status,
        "route" => route.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}
