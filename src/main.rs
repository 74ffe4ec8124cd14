//! Cachefront - a key-value server with a cache-aside layer
//!
//! Serves GET/PUT/DELETE over HTTP from a bounded LRU cache backed by a
//! pluggable durable store.

mod api;
mod cache;
mod config;
mod coordinator;
mod dispatch;
mod error;
mod models;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use dispatch::Dispatcher;
use store::{FileStore, MemoryStore, Store};

/// Main entry point for the Cachefront server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the backing store (file-backed if configured, in-memory otherwise)
/// 4. Wire up cache, statistics counters and coordinator
/// 5. Start the dispatcher worker pool on the configured port
/// 6. On SIGINT/SIGTERM, stop the dispatcher and log final statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachefront=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cachefront KV Server");

    // Load configuration from environment variables
    let config = Config::from_env();
    anyhow::ensure!(config.cache_capacity > 0, "CACHE_SIZE must be positive");
    anyhow::ensure!(config.pool_size > 0, "WORKER_POOL_SIZE must be positive");
    info!(
        "Configuration loaded: cache_capacity={}, pool_size={}, port={}, data_file={:?}",
        config.cache_capacity, config.pool_size, config.server_port, config.data_file
    );

    // Open the backing store
    let store: Arc<dyn Store> = match &config.data_file {
        Some(path) => Arc::new(
            FileStore::open(path)
                .with_context(|| format!("failed to open data file {}", path.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };

    // Wire up application state and routes
    let state = AppState::from_config(&config, store);
    let app = create_router(state.clone());

    // Start the dispatcher worker pool
    let dispatcher = Dispatcher::new(app, config.pool_size);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    dispatcher
        .start(addr)
        .await
        .context("failed to start dispatcher")?;
    info!("Server listening on http://{}", addr);

    // Wait for shutdown signal, then drain the workers
    shutdown_signal().await;
    dispatcher.stop().await;

    // Final statistics, as a parting log line
    let stats = state.stats.snapshot();
    info!(
        "Final statistics: total_requests={}, cache_hits={}, cache_misses={}, hit_rate={:.4}",
        stats.total_requests, stats.cache_hits, stats.cache_misses, stats.hit_rate
    );
    info!("Server shutdown complete");

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
