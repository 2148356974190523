//! HTTP server for storytimed

use crate::config::{Config, ServerConfig};
use crate::generator::StoryGenerator;
use crate::middleware::{body_size_limit, internal_error_for_panic, BodyLimit};
use crate::routes;
use crate::store::{create_shared_store, SharedStore};
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use storytime_common::llm_client::{HttpLlmClient, LlmClient};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub store: SharedStore,
    pub generator: Arc<StoryGenerator>,
    pub start_time: Instant,
}

impl AppState {
    /// Fresh store plus the given generator.
    pub fn new(generator: StoryGenerator) -> Self {
        Self {
            store: create_shared_store(),
            generator: Arc::new(generator),
            start_time: Instant::now(),
        }
    }

    /// State wired to the real provider client described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = HttpLlmClient::new(config.llm.clone()).context("Failed to build provider client")?;
        info!("[BOOT] Provider model: {}", http.model());
        let client: Arc<dyn LlmClient> = Arc::new(http);
        let generator = StoryGenerator::new(client, &config.llm, config.illustration.clone());
        Ok(Self::new(generator))
    }
}

/// Build the router with every route and layer.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let state = Arc::new(state);
    let limit = BodyLimit(server.max_body_bytes);

    let app = Router::new()
        .merge(routes::story_routes())
        .merge(routes::settings_routes())
        .merge(routes::catalog_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(axum::middleware::from_fn_with_state(limit, body_size_limit))
        .layer(CatchPanicLayer::custom(internal_error_for_panic))
        .layer(TraceLayer::new_for_http());

    if server.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Run the HTTP server until Ctrl-C
pub async fn run(state: AppState, server: &ServerConfig) -> Result<()> {
    let app = build_router(state, server);

    let listener = tokio::net::TcpListener::bind(&server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server.bind_addr))?;
    info!("[BOOT] Listening on http://{}", server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutting down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
