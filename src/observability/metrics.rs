//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (latency, request count, open connections)
//! - Expose Prometheus-compatible text for the scrape endpoint
//!
//! # Metrics
//! - `http_request_duration_milliseconds` (histogram): latency by `url`
//! - `http_requests_total` (counter): responses by `url`, `method`, `status`
//! - `http_connections_active` (gauge): currently open connections
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - The recorder is owned by [`PrometheusMetrics`] instead of being installed
//!   globally, so each server (and each test) has its own registry
//! - Histogram buckets tuned for a lightweight handler: 10ms .. 1s

use std::time::Instant;

use metrics::{Recorder, Unit};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

use crate::config::MetricsConfig;

/// Value of the `service` label attached to every exported series.
pub const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

pub const REQUEST_DURATION: &str = "http_request_duration_milliseconds";
pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const CONNECTIONS_ACTIVE: &str = "http_connections_active";

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Error raised while building the metrics recorder. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to build prometheus recorder: {0}")]
    Build(#[from] BuildError),
}

/// Wall-clock duration of one request, as handed to a [`MetricsSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyMeasurement {
    pub route_label: String,
    pub elapsed_ms: f64,
}

impl LatencyMeasurement {
    pub fn new(route_label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            route_label: route_label.into(),
            elapsed_ms,
        }
    }

    /// Measure from `start` until now, in fractional milliseconds.
    pub fn since(route_label: impl Into<String>, start: Instant) -> Self {
        let elapsed_ms = start.elapsed().as_nanos() as f64 / 1_000_000.0;
        Self::new(route_label, elapsed_ms)
    }
}

/// Destination for request metrics.
///
/// Implementations must not block the caller and must never fail a request:
/// problems are logged by the sink itself.
pub trait MetricsSink: Send + Sync + 'static {
    fn record_latency(&self, measurement: &LatencyMeasurement);

    fn record_response(&self, _route_label: &str, _method: &str, _status: u16) {}

    fn set_active_connections(&self, _count: u64) {}
}

/// Prometheus-backed metrics sink.
pub struct PrometheusMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl PrometheusMetrics {
    /// Build a recorder whose latency histogram uses the configured boundaries.
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .add_global_label("service", SERVICE_NAME)
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &config.buckets)?
            .build_recorder();
        let handle = recorder.handle();

        let metrics = Self { recorder, handle };
        metrics.describe();

        tracing::debug!(buckets = ?config.buckets, "Metrics recorder built");
        Ok(metrics)
    }

    fn describe(&self) {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::describe_histogram!(REQUEST_DURATION, Unit::Milliseconds, "Service latency");
            metrics::describe_counter!(REQUESTS_TOTAL, "Responses sent, by route, method and status");
            metrics::describe_gauge!(CONNECTIONS_ACTIVE, "Currently open client connections");
        });
    }

    /// Current aggregates in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Drain pending histogram samples into their aggregates.
    ///
    /// Rendering does this too; calling it periodically bounds memory when
    /// nobody scrapes.
    pub fn run_upkeep(&self) {
        self.handle.run_upkeep();
    }

    fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        let recorder: &dyn Recorder = &self.recorder;
        metrics::with_local_recorder(recorder, f)
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_latency(&self, measurement: &LatencyMeasurement) {
        self.with_recorder(|| {
            metrics::histogram!(REQUEST_DURATION, "url" => measurement.route_label.clone())
                .record(measurement.elapsed_ms);
        });
    }

    fn record_response(&self, route_label: &str, method: &str, status: u16) {
        self.with_recorder(|| {
            metrics::counter!(
                REQUESTS_TOTAL,
                "url" => route_label.to_owned(),
                "method" => method.to_owned(),
                "status" => status.to_string()
            )
            .increment(1);
        });
    }

    fn set_active_connections(&self, count: u64) {
        self.with_recorder(|| {
            metrics::gauge!(CONNECTIONS_ACTIVE).set(count as f64);
        });
    }
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}
