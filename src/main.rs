//! Todo bot - chat-driven to-do list manager
//!
//! Receives chat platform webhooks, resolves each message to a command and
//! replies through the platform's chat API.

mod api;
mod commands;
mod config;
mod db;
mod dispatcher;
mod messenger;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::BotConfig;
use db::Database;
use dispatcher::Dispatcher;
use messenger::ChatApiClient;
use runtime::{DatabaseStorage, RuntimeManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional .env file; real environment variables take precedence
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_bot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = BotConfig::from_env();
    tracing::info!(
        base_url = %config.base_url,
        redirect_uri = %config.redirect_uri(),
        app_slug = ?config.app_slug,
        oauth_secret_set = config.oauth_secret.is_some(),
        "Configuration loaded"
    );

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;
    let storage = Arc::new(DatabaseStorage::new(db));

    // Outbound chat client
    if config.api_key.is_none() {
        tracing::warn!("DIVAR_API_KEY is not set. Replies will not be delivered.");
    }
    let messenger = Arc::new(ChatApiClient::new(
        config.api_key.clone(),
        &config.chat_api_base_url,
    )?);

    // Create application state
    let dispatcher = Arc::new(Dispatcher::new(storage, messenger));
    let runtime = Arc::new(RuntimeManager::new(dispatcher, config.worker_idle_timeout));
    let state = AppState::new(runtime);

    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Todo bot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
