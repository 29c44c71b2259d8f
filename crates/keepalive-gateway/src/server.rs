//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use keepalive_agent::Keeper;
use keepalive_core::config::GatewayConfig;
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub keeper: Arc<Keeper>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(keeper: Arc<Keeper>) -> Self {
        Self {
            keeper,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the Axum router. Only a POST to the webhook path carries an update;
/// every other method and path gets the same plain `OK`.
pub fn build_router(state: AppState, webhook_path: &str) -> Router {
    let mut router = Router::new().route(
        webhook_path,
        any(super::routes::acknowledge).post(super::routes::telegram_webhook),
    );
    if webhook_path != "/health" {
        router = router.route(
            "/health",
            get(super::routes::health_check).fallback(super::routes::acknowledge),
        );
    }
    router
        .fallback(super::routes::acknowledge)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind and serve until the process is stopped.
pub async fn start(config: &GatewayConfig, keeper: Arc<Keeper>) -> anyhow::Result<()> {
    let app = build_router(AppState::new(keeper), &config.webhook_path);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        "🌐 Gateway listening on http://{}{}",
        addr,
        config.webhook_path
    );

    axum::serve(listener, app).await?;
    Ok(())
}
