//! API Module
//!
//! HTTP handlers and routing for inspecting and driving a model cache.
//!
//! # Endpoints
//! - `PUT /models` - Write a model
//! - `GET /models/:key` - Read a model
//! - `DELETE /models/:key` - Delete a model
//! - `GET /stats` - Get cache statistics
//! - `POST /resize` - Change the cache bound
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
