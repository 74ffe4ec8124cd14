//! API Handlers
//!
//! HTTP request handlers for each key-value server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::{RecencyCache, StatsCounters};
use crate::config::Config;
use crate::coordinator::OperationCoordinator;
use crate::error::{KvError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, KeyQuery, PutRequest, PutResponse, StatsResponse,
};
use crate::store::Store;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Executes the cache-aside protocol for every operation
    pub coordinator: Arc<OperationCoordinator>,
    /// Process-wide request counters
    pub stats: Arc<StatsCounters>,
}

impl AppState {
    /// Creates a new AppState from its shared parts.
    pub fn new(coordinator: Arc<OperationCoordinator>, stats: Arc<StatsCounters>) -> Self {
        Self { coordinator, stats }
    }

    /// Wires up cache, coordinator and counters from configuration and a
    /// backing store.
    pub fn from_config(config: &Config, store: Arc<dyn Store>) -> Self {
        let cache = Arc::new(RecencyCache::new(config.cache_capacity));
        let stats = Arc::new(StatsCounters::new());
        let coordinator = Arc::new(OperationCoordinator::new(cache, store, Arc::clone(&stats)));
        Self::new(coordinator, stats)
    }
}

/// Handler for POST /api/kv
///
/// Writes the pair to the backing store, then refreshes the cache.
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(KvError::InvalidRequest(error_msg));
    }

    let key = req.key.clone();
    state.coordinator.put(req.key, req.value)?;

    Ok(Json(PutResponse::new(key)))
}

/// Handler for GET /api/kv?key=...
///
/// Serves from the cache when possible, falling back to the backing store.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(params): Query<KeyQuery>,
) -> Result<Json<GetResponse>> {
    if params.key.is_empty() {
        return Err(KvError::InvalidRequest(
            "Missing key parameter".to_string(),
        ));
    }

    let value = state.coordinator.get(&params.key)?;

    Ok(Json(GetResponse::new(params.key, value)))
}

/// Handler for DELETE /api/kv?key=...
///
/// Removes the pair from the backing store and the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Query(params): Query<KeyQuery>,
) -> Result<Json<DeleteResponse>> {
    if params.key.is_empty() {
        return Err(KvError::InvalidRequest(
            "Missing key parameter".to_string(),
        ));
    }

    state.coordinator.delete(&params.key)?;

    Ok(Json(DeleteResponse::new(params.key)))
}

/// Handler for GET /stats
///
/// Returns the current statistics snapshot; not counted as an operation.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.stats.snapshot()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
