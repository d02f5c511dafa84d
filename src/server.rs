//! HTTP Server
//!
//! Serves the disk metrics for Prometheus to scrape.
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Health check (200 unless the last pass could not enumerate disks)
//!
//! # Metrics Collection
//!
//! Every scrape runs one full collection pass on the blocking thread pool, so the
//! exported data is never older than the scrape itself. Disks that fail during a
//! pass are left out of that scrape; only a failure to enumerate disks at all
//! turns into a 503.

use crate::collectors::{CollectionPass, SmartCollector};
use crate::error::ExporterError;
use crate::metrics;
use crate::smart::DiskSource;
use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Collector shared between the HTTP handlers and the textfile loop
pub type SharedCollector = Arc<SmartCollector<Arc<dyn DiskSource>>>;

#[derive(Clone)]
pub struct AppState {
    collector: SharedCollector,
    healthy: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(collector: SharedCollector) -> Self {
        Self {
            collector,
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn start(collector: SharedCollector, addr: &str) -> anyhow::Result<()> {
    let app = router(AppState::new(collector));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ExporterError::Server(format!("failed to bind to {}: {}", addr, e)))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    Ok(())
}

/// Run one collection pass off the async runtime
///
/// Concurrent callers wait for the running pass to finish. The lock guard moves
/// into the blocking task, so a dropped scrape cannot release it early.
pub async fn run_pass(collector: &SharedCollector) -> anyhow::Result<CollectionPass> {
    let guard = collector.pass_lock().lock_owned().await;
    let collector = Arc::clone(collector);
    let pass = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        collector.collect_pass()
    })
    .await
    .context("Collection task panicked")??;
    Ok(pass)
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>PySMART Exporter</title></head>
<body>
<h1>PySMART Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let pass = match run_pass(&state.collector).await {
        Ok(pass) => {
            state.healthy.store(true, Ordering::Relaxed);
            pass
        }
        Err(e) => {
            error!("Failed to collect metrics: {:#}", e);
            state.healthy.store(false, Ordering::Relaxed);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Error collecting metrics: {:#}", e),
            )
                .into_response();
        }
    };

    match metrics::render(&pass.families) {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.healthy.load(Ordering::Relaxed) {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Disk enumeration failed")
    }
}
