//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI / environment overrides
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to startup, which wires every subsystem from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_config, ConfigError, ConfigOverrides};
pub use schema::GreetingConfig;
pub use schema::ListenerConfig;
pub use schema::LoggingConfig;
pub use schema::MetricsConfig;
pub use schema::RouteLabel;
pub use schema::ServiceConfig;
pub use schema::ShutdownConfig;
pub use validation::{validate_config, ValidationError};
