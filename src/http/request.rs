//! Request correlation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Capture the URL and method the request arrived with
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Inbound `x-request-id` headers are ignored; the ID is always generated here
//! - The context is immutable once created and travels in request extensions

use axum::extract::Request;
use axum::http::HeaderName;
use uuid::Uuid;

/// Response header echoing the correlation ID.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request correlation fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationContext {
    id: String,
    url: String,
    method: String,
}

impl CorrelationContext {
    /// Create a context with a freshly generated ID.
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            method: method.into(),
        }
    }

    /// Context for an inbound request. The URL is kept in origin form
    /// (path and query) whatever form the request line or `:path` used.
    pub fn from_request(request: &Request) -> Self {
        let uri = request.uri();
        let url = uri
            .path_and_query()
            .map_or_else(|| uri.path(), |pq| pq.as_str());
        Self::new(url, request.method().as_str())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path and query of the request.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}
