//! Chat relay server.
//!
//! Run with: cargo run -p chat-relay-server
//!
//! Then stream a reply with:
//! `curl -N -X POST localhost:8000/api/chat -H 'content-type: application/json' -d '{"message":"hi"}'`

mod config;

use std::sync::Arc;

use anyhow::Context;
use chat_relay_session::{SessionManager, storage::MemoryStorage};
use chat_relay_transport::create_chat_router;
use chat_relay_upstream::OpenAiCompatClient;
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional; real environment wins over .env entries.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::parse();

    if config.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY is not set; upstream will reject chat requests");
    }

    let client = OpenAiCompatClient::new(config.api_key.clone()).with_base_url(&config.base_url);
    let storage = MemoryStorage::with_system_prompt(config.system_prompt.clone());
    let manager = Arc::new(
        SessionManager::new(storage, client).with_default_model(config.default_model.clone()),
    );

    tracing::info!(
        base_url = %config.base_url,
        default_model = %config.default_model,
        "Upstream configured"
    );

    // Build router
    let app = create_chat_router(manager)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Chat relay listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Chat relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
