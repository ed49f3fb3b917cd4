//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Histogram boundaries for request latency, in milliseconds.
pub const DEFAULT_LATENCY_BUCKETS_MS: [f64; 6] = [10.0, 50.0, 100.0, 200.0, 500.0, 1000.0];

/// Root configuration for the greeter service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Log level and destinations.
    pub logging: LoggingConfig,

    /// Metrics exposition settings.
    pub metrics: MetricsConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Greeting policy.
    pub greeting: GreetingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub level: String,

    /// File that receives a copy of every console record (opened in append mode).
    pub file_path: PathBuf,

    /// Emit JSON records instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            file_path: PathBuf::from("logs/app.log"),
            json: false,
        }
    }
}

/// Which value is used as the `url` label on request metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteLabel {
    /// The literal request path. Unbounded if routes ever take path parameters.
    #[default]
    Path,
    /// The route template the request matched (e.g. `/users/{id}`).
    MatchedRoute,
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Path the Prometheus exposition is served on.
    pub path: String,

    /// Latency histogram boundaries in milliseconds, strictly increasing.
    pub buckets: Vec<f64>,

    /// Source of the route label.
    pub route_label: RouteLabel,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: "/metrics".to_string(),
            buckets: DEFAULT_LATENCY_BUCKETS_MS.to_vec(),
            route_label: RouteLabel::Path,
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight connections may keep running after a shutdown signal.
    pub grace_period_secs: u64,

    /// Exit immediately when a second termination signal arrives while draining.
    pub force_exit_on_repeat: bool,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
            force_exit_on_repeat: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout in seconds. Unset means requests may run indefinitely.
    pub request_secs: Option<u64>,
}

/// Greeting policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GreetingConfig {
    /// Names longer than this (in bytes) are rejected with a 500.
    pub max_name_length: Option<usize>,
}
