//! Postgate application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Connect to Redis and check it answers
//! 3. Build the token codec and password hasher
//! 4. Build router with API routes, CORS, body limit and security headers
//! 5. Start Axum server

use postgate::{auth::middleware::AppState, config::Config, routes, storage::RedisStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset, so security warnings are visible.
const DEFAULT_LOG_FILTER: &str = "postgate=info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() {
    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    tracing::info!("Starting postgate on {}", config.bind_addr);

    let store = RedisStore::open(&config.redis_url)?;
    store.ping().await?;
    tracing::info!("Connected to Redis");

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, Arc::new(store))?;
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
