//! HTTP middleware.

pub mod observability;

pub use observability::{observability_middleware, ObservabilityState};
