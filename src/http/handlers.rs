use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use crate::greeting::{Greeter, GreetingError};
use crate::observability::context::RequestLogger;
use crate::observability::metrics::{PrometheusMetrics, EXPOSITION_CONTENT_TYPE};

/// State injected into the route handlers.
#[derive(Clone)]
pub struct AppState {
    pub greeter: Arc<Greeter>,
    pub metrics: Arc<PrometheusMetrics>,
}

impl IntoResponse for GreetingError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{self}\n")).into_response()
    }
}

/// `GET /?name=...`
pub async fn greet(
    State(state): State<AppState>,
    logger: RequestLogger,
    RawQuery(query): RawQuery,
) -> Response {
    let log = logger.scoped("handler");
    log.in_scope(|| tracing::debug!("handler started"));

    let name = query_param(query.as_deref(), "name").unwrap_or_default();
    match state.greeter.greet(&logger, &name) {
        Ok(response) => {
            log.in_scope(|| tracing::info!(response = %response, "handler finished"));
            response.into_response()
        }
        Err(e) => {
            log.in_scope(|| tracing::error!(error = %e, "Failed to build greeting"));
            e.into_response()
        }
    }
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

/// First value of `key` in a query string.
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
