//! HTTP surface: the upload page and a JSON API over the same batch driver.

pub mod handlers;
pub mod page;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use toonspot_core::config::LimitsConfig;
use toonspot_core::BatchRunner;

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Settings>,
}

struct Settings {
    runner: BatchRunner,
    pages: page::Pages,
    labels: &'static [&'static str],
    default_threshold: f32,
    max_files: usize,
    item_timeout: Duration,
}

impl AppState {
    /// Fails only if a page template does not compile.
    pub fn new(
        runner: BatchRunner,
        labels: &'static [&'static str],
        default_threshold: f32,
        limits: &LimitsConfig,
    ) -> Result<Self, minijinja::Error> {
        Ok(Self {
            inner: Arc::new(Settings {
                runner,
                pages: page::Pages::new()?,
                labels,
                default_threshold,
                max_files: limits.max_files_per_request,
                item_timeout: Duration::from_millis(limits.item_timeout_ms),
            }),
        })
    }
}

/// Largest request body accepted: every file at its size limit, plus slack
/// for the form fields and multipart framing.
pub fn body_limit(limits: &LimitsConfig) -> usize {
    usize::try_from(limits.max_file_size_bytes())
        .unwrap_or(usize::MAX)
        .saturating_mul(limits.max_files_per_request)
        .saturating_add(1024 * 1024)
}

/// Build the application router.
pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/classify", post(handlers::classify_page))
        .route("/api/classify", post(handlers::classify_api))
        .route("/api/labels", get(handlers::labels))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
