//! Eviction Policy Module
//!
//! Keeps the running size of an [`EntryStore`] within its bound by evicting
//! least recently used entries.

use std::hash::Hash;

use tracing::debug;

use crate::cache::EntryStore;

// == Eviction Policy ==
/// Size-bounded LRU eviction.
///
/// Eviction stops once the running size fits, or when a single entry is left:
/// an entry larger than the whole bound is kept until it is superseded or
/// pushed out by a later write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    max_size: u64,
}

impl EvictionPolicy {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// True while `size` is over the bound and more than one entry remains.
    pub fn must_evict(&self, size: u64, entry_count: usize) -> bool {
        size > self.max_size && entry_count > 1
    }

    // == Enforce ==
    /// Evicts until the store fits, counting each eviction.
    ///
    /// Returns the number of entries evicted.
    pub fn enforce<K, V>(&self, store: &mut EntryStore<K, V>) -> usize
    where
        K: Eq + Hash + Clone,
    {
        let mut evicted = 0;
        while self.must_evict(store.size(), store.entry_count()) {
            if !store.evict_one_least_recently_used() {
                break;
            }
            evicted += 1;
        }

        if evicted > 0 {
            debug!(
                "Evicted {} entries, size now {}/{}",
                evicted,
                store.size(),
                self.max_size
            );
        }
        evicted
    }

    // == Trim ==
    /// Evicts until the store fits without touching the eviction counter.
    ///
    /// Used when seeding a fresh copy, whose counters must start at zero and
    /// whose size must start within the bound, so no oversized entry is kept.
    pub fn trim<K, V>(&self, store: &mut EntryStore<K, V>) -> usize
    where
        K: Eq + Hash + Clone,
    {
        let mut trimmed = 0;
        while store.size() > self.max_size {
            if store.discard_least_recently_used().is_none() {
                break;
            }
            trimmed += 1;
        }
        trimmed
    }
}
