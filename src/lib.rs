//! Model Cache - A bounded, instrumented cache for materialized models
//!
//! Sits in front of a key-value model store, evicting least recently used
//! entries by reported size, remembering deletions as tombstones and letting
//! each call skip or refresh the cache.

pub mod api;
pub mod backend;
pub mod cache;
pub mod cached_store;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use backend::{MemoryStore, ModelStore, SizedModel};
pub use cache::{CacheEntry, CopyMaxSize, ModelCache, ReadMode, StatsSnapshot, WriteMode};
pub use cached_store::CachedStore;
pub use config::{CacheConfig, Config, CopySeeding};
pub use error::CacheError;
pub use tasks::spawn_stats_reporter;
