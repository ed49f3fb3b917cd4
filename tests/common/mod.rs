//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;

use greeter_service::config::{ListenerConfig, ServiceConfig};
use greeter_service::lifecycle::{DrainOutcome, ShutdownCoordinator};
use greeter_service::net::Listener;
use greeter_service::observability::{MetricsSink, PrometheusMetrics};
use greeter_service::HttpServer;

/// A server running on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: ShutdownCoordinator,
    pub handle: JoinHandle<DrainOutcome>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

fn loopback() -> ListenerConfig {
    ListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        ..Default::default()
    }
}

async fn spawn(server: HttpServer) -> TestServer {
    let listener = Listener::bind(&loopback()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownCoordinator::new();
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));
    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Start the full service with `config`; the listener section is ignored.
pub async fn start_service(config: ServiceConfig) -> (TestServer, Arc<PrometheusMetrics>) {
    let metrics = Arc::new(PrometheusMetrics::new(&config.metrics).unwrap());
    let server = HttpServer::new(&config, metrics.clone());
    (spawn(server).await, metrics)
}

/// Serve a custom router with the production connection handling.
pub async fn start_router(router: Router, grace_period: Duration) -> TestServer {
    let metrics: Arc<dyn MetricsSink> = Arc::new(PrometheusMetrics::new(&Default::default()).unwrap());
    spawn(HttpServer::with_router(router, metrics, grace_period)).await
}

/// HTTP client that never goes through a proxy from the environment.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

/// Value of the first exposition line of `series` carrying every label in `labels`.
pub fn sample(rendered: &str, series: &str, labels: &[&str]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| line.starts_with(&format!("{series}{{")))
        .find(|line| labels.iter().all(|label| line.contains(label)))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}
