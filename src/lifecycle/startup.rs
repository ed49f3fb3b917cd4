//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Register signal handlers before any traffic is accepted
//! - Start background tasks (metrics upkeep)
//! - Bind the listener and serve until shutdown completes
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener starts last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::{DrainOutcome, ShutdownCoordinator};
use crate::lifecycle::signals::{watch_signals, SignalListener, SignalSource, WatchOutcome};
use crate::net::{Listener, ListenerError};
use crate::observability::metrics::{MetricsError, PrometheusMetrics};

/// How often pending histogram samples are folded into their aggregates.
const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Unrecoverable failure before the service could start serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to initialize metrics: {0}")]
    Metrics(#[from] MetricsError),
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] std::io::Error),
    #[error("failed to listen: {0}")]
    Listener(#[from] ListenerError),
}

/// How a run that started successfully ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The server drained and stopped.
    Drained(DrainOutcome),
    /// A repeated signal abandoned the drain. Open connections were dropped.
    ForcedExit,
}

/// Run the service until a termination signal has been handled.
///
/// Logging must already be initialized.
pub async fn run(config: ServiceConfig) -> Result<RunOutcome, StartupError> {
    let metrics = Arc::new(PrometheusMetrics::new(&config.metrics)?);
    let signals = SignalListener::register().map_err(StartupError::Signals)?;
    serve(config, metrics, signals).await
}

async fn serve<S>(
    config: ServiceConfig,
    metrics: Arc<PrometheusMetrics>,
    signals: S,
) -> Result<RunOutcome, StartupError>
where
    S: SignalSource + Send + 'static,
{
    let shutdown = ShutdownCoordinator::new();
    let mut watcher = tokio::spawn(watch_signals(
        signals,
        shutdown.clone(),
        config.shutdown.force_exit_on_repeat,
    ));

    spawn_metrics_upkeep(metrics.clone(), shutdown.subscribe());

    let listener = Listener::bind(&config.listener).await?;
    let server = HttpServer::new(&config, metrics);

    tracing::info!("starting server");
    let outcome = tokio::select! {
        biased;
        Ok(WatchOutcome::ForceExit(_)) = &mut watcher => RunOutcome::ForcedExit,
        drained = server.run(listener, shutdown) => RunOutcome::Drained(drained),
    };
    Ok(outcome)
}

fn spawn_metrics_upkeep(metrics: Arc<PrometheusMetrics>, stop: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(METRICS_UPKEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = interval.tick() => metrics.run_upkeep(),
            }
        }
    });
}
