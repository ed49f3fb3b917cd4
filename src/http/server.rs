//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (observability, optional request timeout)
//! - Serve HTTP/1.1 and HTTP/2 connections from the bounded listener
//! - Stop accepting on shutdown, drain in-flight connections within the grace period

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto, graceful::GracefulShutdown},
};
use tokio::task::JoinSet;
use tower::ServiceExt;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServiceConfig;
use crate::greeting::Greeter;
use crate::http::handlers::{self, AppState};
use crate::http::middleware::{observability_middleware, ObservabilityState};
use crate::lifecycle::{DrainOutcome, ShutdownCoordinator};
use crate::net::{ConnectionTracker, Listener};
use crate::observability::metrics::{MetricsSink, PrometheusMetrics};

/// Pause after a failed accept so a persistent error (e.g. EMFILE) doesn't spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// HTTP server for the greeter service.
pub struct HttpServer {
    router: Router,
    metrics: Arc<dyn MetricsSink>,
    grace_period: Duration,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig, metrics: Arc<PrometheusMetrics>) -> Self {
        let state = AppState {
            greeter: Arc::new(Greeter::new(&config.greeting)),
            metrics: metrics.clone(),
        };
        let router = build_router(config, state);
        Self::with_router(router, metrics, config.shutdown.grace_period())
    }

    /// Serve an arbitrary router with the same connection handling.
    pub fn with_router(router: Router, metrics: Arc<dyn MetricsSink>, grace_period: Duration) -> Self {
        Self {
            router,
            metrics,
            grace_period,
        }
    }

    /// Run the server until `shutdown` is triggered, then drain.
    ///
    /// The listener is dropped as soon as shutdown starts. Connections still
    /// open when the grace period elapses are aborted.
    pub async fn run(self, listener: Listener, shutdown: ShutdownCoordinator) -> DrainOutcome {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "HTTP server starting");
        }

        let builder = auto::Builder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let tracker = ConnectionTracker::new();
        let mut connections = JoinSet::new();

        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            // Reap finished connection tasks.
            while connections.try_join_next().is_some() {}

            let (stream, peer_addr, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            };

            let guard = tracker.track();
            self.metrics.set_active_connections(tracker.active_count());

            let router = self.router.clone();
            let service = hyper::service::service_fn(move |request: hyper::Request<Incoming>| {
                router.clone().oneshot(request)
            });
            let connection = builder
                .serve_connection_with_upgrades(TokioIo::new(stream), service)
                .into_owned();
            let connection = graceful.watch(connection);

            let metrics = self.metrics.clone();
            let tracker = tracker.clone();
            connections.spawn(async move {
                let connection_id = guard.id();
                if let Err(e) = connection.await {
                    tracing::debug!(%connection_id, peer_addr = %peer_addr, error = %e, "Connection error");
                }
                drop(guard);
                drop(permit);
                metrics.set_active_connections(tracker.active_count());
            });
        }

        drop(listener);
        let in_flight = tracker.active_count();
        tracing::info!(
            in_flight,
            grace_period_ms = self.grace_period.as_millis() as u64,
            "Listener closed, draining connections"
        );

        let outcome = tokio::select! {
            _ = graceful.shutdown() => DrainOutcome::Graceful,
            _ = tokio::time::sleep(self.grace_period) => {
                let aborted = tracker.active_count();
                tracing::error!(aborted, "Grace period elapsed, closing remaining connections");
                connections.abort_all();
                DrainOutcome::Forced { aborted }
            }
        };

        while connections.join_next().await.is_some() {}
        self.metrics.set_active_connections(tracker.active_count());
        shutdown.mark_stopped();

        tracing::info!(?outcome, "HTTP server stopped");
        outcome
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let observability = ObservabilityState::new(state.metrics.clone(), config.metrics.route_label);

    let mut router = Router::new()
        .route("/", get(handlers::greet))
        .route(&config.metrics.path, get(handlers::metrics))
        .with_state(state);

    if let Some(secs) = config.timeouts.request_secs {
        router = router.route_layer(TimeoutLayer::new(Duration::from_secs(secs)));
    }

    // Outermost, so timed-out requests are still measured.
    router.route_layer(middleware::from_fn_with_state(
        observability,
        observability_middleware,
    ))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::Request,
        http::{header, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::observability::metrics::test_support::histogram_count;
    use crate::observability::metrics::REQUEST_DURATION;

    fn app(config: &ServiceConfig) -> (Router, Arc<PrometheusMetrics>) {
        let metrics = Arc::new(PrometheusMetrics::new(&config.metrics).unwrap());
        let state = AppState {
            greeter: Arc::new(Greeter::new(&config.greeting)),
            metrics: metrics.clone(),
        };
        (build_router(config, state), metrics)
    }

    async fn send(router: &Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn greets_and_counts_every_request() {
        let (router, metrics) = app(&ServiceConfig::default());

        for expected_count in 1..=3 {
            assert_eq!(
                send(&router, "/?name=Alice").await,
                (StatusCode::OK, "Hi Alice".to_owned())
            );
            assert_eq!(histogram_count(&metrics.render(), REQUEST_DURATION, "/"), expected_count);
        }
    }

    #[tokio::test]
    async fn short_and_missing_names() {
        let (router, _) = app(&ServiceConfig::default());
        assert_eq!(
            send(&router, "/?name=abcd").await.1,
            "Hello abcd! Your name is to short\n"
        );
        assert_eq!(send(&router, "/?name=abcde").await.1, "Hi abcde");
        assert_eq!(send(&router, "/").await.1, "Hello ! Your name is to short\n");
    }

    #[tokio::test]
    async fn greeting_failure_is_a_500_with_message() {
        let mut config = ServiceConfig::default();
        config.greeting.max_name_length = Some(8);
        let (router, metrics) = app(&config);

        let (status, body) = send(&router, "/?name=Maximilian").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "name is too long: 10 bytes exceeds the limit of 8\n");
        assert_eq!(histogram_count(&metrics.render(), REQUEST_DURATION, "/"), 1);
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_exposition() {
        let (router, _) = app(&ServiceConfig::default());
        send(&router, "/?name=Alice").await;

        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(histogram_count(&body, REQUEST_DURATION, "/"), 1);
    }

    #[tokio::test]
    async fn metrics_path_is_configurable() {
        let mut config = ServiceConfig::default();
        config.metrics.path = "/internal/metrics".into();
        let (router, _) = app(&config);

        assert_eq!(send(&router, "/internal/metrics").await.0, StatusCode::OK);
        assert_eq!(send(&router, "/metrics").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    #[allow(deprecated)]
    async fn timed_out_requests_are_measured() {
        let metrics = Arc::new(PrometheusMetrics::new(&Default::default()).unwrap());
        let observability = ObservabilityState::new(metrics.clone(), Default::default());

        // Same layering as build_router, around a handler that never finishes in time.
        let router = Router::new()
            .route(
                "/",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route_layer(TimeoutLayer::new(Duration::from_secs(1)))
            .route_layer(middleware::from_fn_with_state(
                observability,
                observability_middleware,
            ));

        let (status, _) = send(&router, "/").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(histogram_count(&metrics.render(), REQUEST_DURATION, "/"), 1);
    }
}
