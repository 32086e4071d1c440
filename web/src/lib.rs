pub mod routes;
pub mod view;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use database::Database;
use llm_interface::OpenAiClient;
use reddit_client::RedditClient;
use subscope_core::AppConfig;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub reddit: Arc<RedditClient>,
    pub llm: Arc<OpenAiClient>,
    pub classify_concurrency: usize,
}

/// Build the application router over the given state.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the server fails to bind or serve.
pub async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let app = app(state);

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app).await.context("Web server error")
}
