//! Request observability middleware.
//! Binds a correlation context and logger to every request, then times it.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::config::RouteLabel;
use crate::http::request::{CorrelationContext, X_REQUEST_ID};
use crate::observability::context::RequestLogger;
use crate::observability::metrics::{LatencyMeasurement, MetricsSink};

/// State shared by every invocation of [`observability_middleware`].
#[derive(Clone)]
pub struct ObservabilityState {
    sink: Arc<dyn MetricsSink>,
    route_label: RouteLabel,
}

impl ObservabilityState {
    pub fn new(sink: Arc<dyn MetricsSink>, route_label: RouteLabel) -> Self {
        Self { sink, route_label }
    }

    fn route_label(&self, request: &Request) -> String {
        let path = request.uri().path();
        match self.route_label {
            RouteLabel::Path => path.to_owned(),
            RouteLabel::MatchedRoute => request
                .extensions()
                .get::<MatchedPath>()
                .map_or(path, MatchedPath::as_str)
                .to_owned(),
        }
    }
}

/// Middleware function for per-request logging and latency metrics.
///
/// Install with `route_layer` so the matched route is known. Panics in the
/// wrapped handler are not caught.
pub async fn observability_middleware(
    State(state): State<ObservabilityState>,
    mut request: Request,
    next: Next,
) -> Response {
    let correlation = CorrelationContext::from_request(&request);
    let logger = RequestLogger::for_request(&correlation);
    let route_label = state.route_label(&request);
    let method = correlation.method().to_owned();
    let request_id = HeaderValue::from_str(correlation.id()).ok();

    request.extensions_mut().insert(correlation);
    request.extensions_mut().insert(logger.clone());

    let start = Instant::now();
    let mut response = next.run(request).instrument(logger.span().clone()).await;
    let measurement = LatencyMeasurement::since(route_label, start);

    let status = response.status().as_u16();
    logger.in_scope(|| {
        tracing::info!(elapsed_ms = measurement.elapsed_ms, status, "request processed");
    });
    state.sink.record_latency(&measurement);
    state.sink.record_response(&measurement.route_label, &method, status);

    if let Some(request_id) = request_id {
        response.headers_mut().insert(X_REQUEST_ID.clone(), request_id);
    }
    response
}
