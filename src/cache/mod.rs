//! Cache Module
//!
//! Bounded model cache with size-based LRU eviction, tombstones for deleted
//! keys and per-call options to bypass or refresh the cache.

mod entry;
mod eviction;
mod lru;
mod model_cache;
mod options;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, MAX_ENTRY_SIZE, TOMBSTONE_SIZE};
pub use eviction::EvictionPolicy;
pub use lru::LruList;
pub use model_cache::ModelCache;
pub use options::{CopyMaxSize, ReadMode, ReadPlan, WriteMode, WritePlan};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{EntryStore, Fill, ReadTicket, WriteOutcome, WriteTicket};
