//! API Handlers
//!
//! HTTP request handlers for each model cache endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::backend::MemoryStore;
use crate::cache::{CopyMaxSize, StatsSnapshot};
use crate::cached_store::CachedStore;
use crate::config::{CacheConfig, Config};
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HealthResponse, PutRequest, PutResponse,
    ReadQuery, ResizeRequest, ResizeResponse, WriteQuery,
};

/// JSON models kept in memory behind a cache.
pub type ModelDb = CachedStore<MemoryStore<String, Value>>;

/// Application state shared across all handlers.
///
/// The cache is internally synchronized; the outer lock only guards swapping
/// in a resized copy.
#[derive(Clone)]
pub struct AppState {
    /// Cached model store, replaced wholesale on resize
    pub db: Arc<RwLock<ModelDb>>,
}

impl AppState {
    /// Creates a new AppState around the given cached store.
    pub fn new(db: ModelDb) -> Self {
        Self {
            db: Arc::new(RwLock::new(db)),
        }
    }

    /// Creates a new AppState with an empty in-memory store.
    pub fn with_cache_config(config: CacheConfig) -> Self {
        Self::new(CachedStore::new(Arc::new(MemoryStore::new()), config))
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_cache_config(config.cache_config()?))
    }
}

/// Handler for GET /models/:key
///
/// Reads a model through the cache according to `?mode=`.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<GetResponse>> {
    let db = state.db.read().await;
    match db.get(&key, query.mode)? {
        Some(model) => Ok(Json(GetResponse::new(key, Value::clone(&model)))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for PUT /models
///
/// Writes a model to the store and, unless skipped, to the cache.
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let db = state.db.read().await;
    db.put(req.key.clone(), req.value, req.mode)?;

    Ok(Json(PutResponse::new(req.key)))
}

/// Handler for DELETE /models/:key
///
/// Deletes a model from the store and, unless skipped, tombstones it.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<WriteQuery>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let db = state.db.read().await;
    db.delete(key.clone(), query.mode)?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
///
/// Returns current cache counters and occupancy.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    let db = state.db.read().await;
    Json(db.stats())
}

/// Handler for POST /resize
///
/// Replaces the live cache with a copy bounded by the requested size.
pub async fn resize_handler(
    State(state): State<AppState>,
    Json(req): Json<ResizeRequest>,
) -> Result<Json<ResizeResponse>> {
    let mut db = state.db.write().await;
    let copy = db.new_copy(CopyMaxSize(req.max_size))?;
    let stats = copy.stats();
    *db = copy;

    info!(
        "Cache resized: max_size={}, entries={}",
        stats.max_size, stats.entry_count
    );

    Ok(Json(ResizeResponse {
        max_size: stats.max_size,
        entry_count: stats.entry_count,
        size: stats.size,
    }))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
