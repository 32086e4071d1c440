use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use database::Database;
use llm_interface::OpenAiClient;
use reddit_client::{RedditClient, RedditClientConfig};
use subscope_core::AppConfig;
use web::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting subscope");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    db.seed_defaults()
        .await
        .context("Failed to seed default subreddits")?;
    info!("Database initialized");

    let reddit = RedditClient::new(RedditClientConfig::from_app_config(&config))
        .context("Failed to create Reddit client")?;
    let llm = OpenAiClient::new(config.openai_api_key.clone(), config.openai_model.clone())
        .context("Failed to create OpenAI client")?;

    let state = AppState {
        db,
        reddit: Arc::new(reddit),
        llm: Arc::new(llm),
        classify_concurrency: config.classify_concurrency,
    };

    tokio::select! {
        result = web::serve(&config, state) => result?,
        () = shutdown_signal() => info!("Shutting down..."),
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,subscope=debug,web=debug,reddit_client=debug,llm_interface=debug")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
