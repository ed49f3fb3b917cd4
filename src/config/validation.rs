//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (grace period > 0, connection limit > 0)
//! - Check addresses and histogram boundaries are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("listener.max_connections must be greater than zero")]
    MaxConnections,
    #[error("logging.level `{0}` is not one of trace, debug, info, warn, error")]
    LogLevel(String),
    #[error("metrics.path `{0}` must start with '/' and must not be '/'")]
    MetricsPath(String),
    #[error("metrics.buckets must not be empty")]
    EmptyBuckets,
    #[error("metrics.buckets must be finite and strictly increasing")]
    UnorderedBuckets,
    #[error("shutdown.grace_period_secs must be greater than zero")]
    GracePeriod,
    #[error("timeouts.request_secs must be greater than zero when set")]
    RequestTimeout,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::MaxConnections);
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ValidationError::LogLevel(config.logging.level.clone()));
    }

    // "/" is the greeting route.
    if !config.metrics.path.starts_with('/') || config.metrics.path == "/" {
        errors.push(ValidationError::MetricsPath(config.metrics.path.clone()));
    }

    let buckets = &config.metrics.buckets;
    if buckets.is_empty() {
        errors.push(ValidationError::EmptyBuckets);
    } else if buckets.iter().any(|b| !b.is_finite()) || buckets.windows(2).any(|w| w[0] >= w[1]) {
        errors.push(ValidationError::UnorderedBuckets);
    }

    if config.shutdown.grace_period_secs == 0 {
        errors.push(ValidationError::GracePeriod);
    }
    if config.timeouts.request_secs == Some(0) {
        errors.push(ValidationError::RequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.listener.max_connections = 0;
        config.metrics.buckets = vec![10.0, 5.0];
        config.shutdown.grace_period_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::MaxConnections,
                ValidationError::UnorderedBuckets,
                ValidationError::GracePeriod,
            ]
        );
    }

    #[test]
    fn rejects_metrics_path_shadowing_greeting() {
        let mut config = ServiceConfig::default();
        config.metrics.path = "/".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsPath("/".into())])
        );
    }

    #[test]
    fn rejects_non_finite_buckets() {
        let mut config = ServiceConfig::default();
        config.metrics.buckets = vec![10.0, f64::INFINITY];
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::UnorderedBuckets])
        );
    }
}
