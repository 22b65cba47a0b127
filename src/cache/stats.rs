//! Cache Statistics Module
//!
//! Tracks cache activity with lock-free counters and exposes serializable
//! snapshots of them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Live activity counters for one cache instance.
///
/// Every counter is monotonically non-decreasing. Updates happen while the
/// cache lock is held, so `Relaxed` ordering is enough; readers may observe a
/// counter a moment before its companions catch up.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    retrieves: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Lookup ==
    /// Records a cache lookup: one retrieve, plus a hit or a miss.
    pub fn record_lookup(&self, hit: bool) {
        self.retrieves.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn retrieves(&self) -> u64 {
        self.retrieves.load(Ordering::Relaxed)
    }

    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of a cache's counters and occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub entry_count: usize,
    pub size: u64,
    pub max_size: u64,
    pub hits: u64,
    pub misses: u64,
    pub retrieves: u64,
    pub puts: u64,
    pub deletes: u64,
    pub evictions: u64,
    /// hits / (hits + misses), or 0.0 before any lookup
    pub hit_rate: f64,
}

impl StatsSnapshot {
    /// Captures the counters together with the given occupancy figures.
    pub fn capture(stats: &CacheStats, entry_count: usize, size: u64, max_size: u64) -> Self {
        let hits = stats.hits();
        let misses = stats.misses();
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        Self {
            entry_count,
            size,
            max_size,
            hits,
            misses,
            retrieves: stats.retrieves(),
            puts: stats.puts(),
            deletes: stats.deletes(),
            evictions: stats.evictions(),
            hit_rate,
        }
    }
}
