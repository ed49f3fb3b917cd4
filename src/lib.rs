//! Greeter service library.
//!
//! A small HTTP service answering `GET /?name=...` with a greeting, with
//! per-request structured logging, a Prometheus latency histogram and a
//! signal-driven graceful shutdown.

pub mod config;
pub mod greeting;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::ShutdownCoordinator;
