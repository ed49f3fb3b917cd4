//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, graceful drain)
//!     → middleware/observability.rs (request ID, logger, latency)
//!     → handlers.rs (greeting, metrics exposition)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use handlers::AppState;
pub use request::{CorrelationContext, X_REQUEST_ID};
pub use server::{build_router, HttpServer};
