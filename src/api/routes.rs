//! API Routes
//!
//! Configures the Axum router with all model cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, put_handler, resize_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /models` - Write a model through the cache
/// - `GET /models/:key` - Read a model (`?mode=cached|skip|refresh`)
/// - `DELETE /models/:key` - Delete a model (`?mode=through|skip`)
/// - `GET /stats` - Cache counters and occupancy
/// - `POST /resize` - Swap in a copy of the cache with a new bound
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/models", put(put_handler))
        .route("/models/:key", get(get_handler).delete(delete_handler))
        .route("/stats", get(stats_handler))
        .route("/resize", post(resize_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
