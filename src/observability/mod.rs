//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP middleware produces:
//!     → context.rs (request-bound logger carried in request extensions)
//!     → logging.rs (structured log events, console + file)
//!     → metrics.rs (latency histogram, response counter, connection gauge)
//!
//! Consumers:
//!     → Log aggregation (stdout, append-only file)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (optionally JSON) for machine parsing
//! - Request ID flows with the logger, never through globals
//! - Metrics recorder is owned by the service, not installed globally

pub mod context;
pub mod logging;
pub mod metrics;

pub use context::RequestLogger;
pub use logging::{init_logging, LogGuard, LoggingError};
pub use metrics::{LatencyMeasurement, MetricsError, MetricsSink, PrometheusMetrics};
