//! Request-scoped loggers.
//!
//! A [`RequestLogger`] is a `tracing` span carrying the correlation fields of
//! one request. The observability middleware stores it in the request
//! extensions; handlers pull it back out with the extractor and hand it down
//! explicitly to whatever they call.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Extensions;
use tracing::Span;

use crate::http::request::CorrelationContext;

/// Logger bound to the execution context of a single request.
///
/// Spans are created at ERROR level so they stay enabled under any filter
/// that lets an event through.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    span: Span,
    request_bound: bool,
}

impl RequestLogger {
    /// Process-wide logger: records carry no request fields.
    pub fn base() -> Self {
        Self {
            span: Span::none(),
            request_bound: false,
        }
    }

    /// Logger carrying `request_id`, `url` and `method` of the given request.
    pub fn for_request(ctx: &CorrelationContext) -> Self {
        let span = tracing::error_span!(
            "request",
            request_id = %ctx.id(),
            url = %ctx.url(),
            method = %ctx.method(),
        );
        Self {
            span,
            request_bound: true,
        }
    }

    /// Logger bound to this execution context, or [`RequestLogger::base`].
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions.get::<Self>().cloned().unwrap_or_else(Self::base)
    }

    /// Child logger tagging every record with the logical operation name.
    pub fn scoped(&self, func: &'static str) -> Self {
        let span = tracing::error_span!(parent: &self.span, "op", func);
        Self {
            span,
            request_bound: self.request_bound,
        }
    }

    /// Whether this logger belongs to a request rather than the process.
    pub fn is_request_bound(&self) -> bool {
        self.request_bound
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Run `f` with this logger's fields attached to every record it emits.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}

impl<S> FromRequestParts<S> for RequestLogger
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions))
    }
}
