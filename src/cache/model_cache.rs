//! Model Cache Module
//!
//! Thread-safe cache facade: per-call options, store delegation, telemetry
//! and resizing by copy.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::backend::SizedModel;
use crate::cache::{
    CacheEntry, CacheStats, CopyMaxSize, EntryStore, EvictionPolicy, Fill, ReadMode, ReadPlan,
    StatsSnapshot, WriteMode, WriteOutcome, WritePlan,
};
use crate::config::{CacheConfig, CopySeeding};
use crate::error::Result;

// == Model Cache ==
/// A bounded cache of materialized models.
///
/// Entry table, recency order and running size sit behind one mutex so
/// eviction always sees them consistently; counters are atomics readable
/// without the lock. Store calls made by `get`, `put` and `delete` happen
/// outside the lock; each takes a ticket first, and overlapping writes on
/// one key drop its entry rather than guess which one the store kept.
#[derive(Debug)]
pub struct ModelCache<K, V> {
    state: Mutex<EntryStore<K, V>>,
    stats: Arc<CacheStats>,
    config: CacheConfig,
}

impl<K: Eq + Hash + Clone, V> ModelCache<K, V> {
    // == Constructor ==
    /// Creates an empty cache from a validated configuration.
    pub fn new(config: CacheConfig) -> Self {
        let stats = Arc::new(CacheStats::new());
        let store = EntryStore::new(EvictionPolicy::new(config.max_size()), Arc::clone(&stats));
        Self {
            state: Mutex::new(store),
            stats,
            config,
        }
    }

    /// Creates an empty cache bounded by `max_size`, which must be non-zero.
    pub fn with_max_size(max_size: u64) -> Result<Self> {
        Ok(Self::new(CacheConfig::new(max_size)?))
    }

    // == New Copy ==
    /// Creates an independent cache bounded by `copy_max_size`.
    ///
    /// The copy has zeroed counters and its own entry table. Depending on the
    /// configured [`CopySeeding`] it starts empty, or with this cache's
    /// entries trimmed to the new bound. Either way it never starts above its
    /// bound.
    pub fn new_copy(&self, copy_max_size: CopyMaxSize) -> Result<Self> {
        let config = self.config.with_max_size(copy_max_size.0)?;
        let copy = Self::new(config);

        if config.copy_seeding() == CopySeeding::CopyThenTrim {
            let snapshot = self.state.lock().snapshot();
            copy.state.lock().seed(snapshot);
        }

        info!(
            "Created cache copy: max_size={}, entries={}, size={}",
            copy.max_size(),
            copy.entry_count(),
            copy.size()
        );
        Ok(copy)
    }

    // == Get ==
    /// Reads `key`, calling `retrieve` when the store has to be consulted.
    ///
    /// - `Cached`: answer from the cache; on a miss retrieve and populate it.
    ///   A store miss is remembered as a tombstone.
    /// - `Skip`: retrieve only, the cache is left alone.
    /// - `Refresh`: look up for the counters, retrieve, then overwrite.
    ///
    /// A retrieval result is not cached if a write on the same key began or
    /// ended while it ran. Store errors are returned unchanged and leave the
    /// cache as it was.
    pub fn get<E, F>(
        &self,
        key: &K,
        mode: ReadMode,
        retrieve: F,
    ) -> std::result::Result<Option<Arc<V>>, E>
    where
        F: FnOnce() -> std::result::Result<Option<SizedModel<V>>, E>,
    {
        let fill = match mode.plan() {
            ReadPlan::Bypass => {
                debug!("Cache skipped for read");
                return Ok(retrieve()?.map(|model| Arc::new(model.value)));
            }
            ReadPlan::LookupThenPopulate => Fill::IfAbsent,
            ReadPlan::FetchAndOverwrite => Fill::Overwrite,
        };

        let ticket = {
            let mut state = self.state.lock();
            match (state.lookup(key), fill) {
                (CacheEntry::Cached { value, .. }, Fill::IfAbsent) => return Ok(Some(value)),
                (CacheEntry::Deleted, Fill::IfAbsent) => return Ok(None),
                _ => state.begin_read(key),
            }
        };

        let entry = match retrieve() {
            Ok(found) => Self::entry_from(found),
            Err(e) => {
                self.state.lock().abandon_read(key, ticket);
                return Err(e);
            }
        };

        let written = self
            .state
            .lock()
            .finish_read(key.clone(), ticket, entry.clone(), fill);
        if !written {
            debug!("Cache entry changed during retrieval; keeping newer entry");
        }
        Ok(entry.into_value())
    }

    fn entry_from(retrieved: Option<SizedModel<V>>) -> CacheEntry<V> {
        match retrieved {
            Some(model) => CacheEntry::cached(Arc::new(model.value), model.size),
            None => CacheEntry::Deleted,
        }
    }

    // == Put ==
    /// Writes `value` with `write`, then caches it unless `mode` is `Skip`.
    ///
    /// `write` returns the stored size, used as the entry's size. Nothing is
    /// cached if it fails.
    pub fn put<E, F>(
        &self,
        key: K,
        value: V,
        mode: WriteMode,
        write: F,
    ) -> std::result::Result<(), E>
    where
        F: FnOnce(&K, &V) -> std::result::Result<u64, E>,
    {
        if mode.plan() == WritePlan::Bypass {
            write(&key, &value)?;
            debug!("Cache skipped for write");
            return Ok(());
        }

        let ticket = self.state.lock().begin_write(&key);
        let size = match write(&key, &value) {
            Ok(size) => size,
            Err(e) => {
                self.state.lock().abandon_write(&key, ticket);
                return Err(e);
            }
        };
        let entry = CacheEntry::cached(Arc::new(value), size);
        let outcome = self.state.lock().finish_write(key, ticket, entry);
        Self::log_outcome(outcome);
        Ok(())
    }

    // == Delete ==
    /// Deletes with `delete`, then leaves a tombstone unless `mode` is `Skip`.
    pub fn delete<E, F>(&self, key: K, mode: WriteMode, delete: F) -> std::result::Result<(), E>
    where
        F: FnOnce(&K) -> std::result::Result<(), E>,
    {
        if mode.plan() == WritePlan::Bypass {
            delete(&key)?;
            debug!("Cache skipped for delete");
            return Ok(());
        }

        let ticket = self.state.lock().begin_write(&key);
        if let Err(e) = delete(&key) {
            self.state.lock().abandon_write(&key, ticket);
            return Err(e);
        }
        let outcome = self
            .state
            .lock()
            .finish_write(key, ticket, CacheEntry::Deleted);
        Self::log_outcome(outcome);
        Ok(())
    }

    fn log_outcome(outcome: WriteOutcome) {
        if outcome == WriteOutcome::Invalidated {
            debug!("Concurrent writes on one key; cache entry invalidated");
        }
    }

    // == Direct Entry Access ==
    /// Looks `key` up, counting a hit or a miss and refreshing its recency.
    pub fn lookup(&self, key: &K) -> CacheEntry<V> {
        self.state.lock().lookup(key)
    }

    /// Inspects `key` without counters or reordering.
    pub fn peek(&self, key: &K) -> CacheEntry<V> {
        self.state.lock().peek(key)
    }

    /// Caches a model directly, without a store write.
    pub fn store(&self, key: K, value: Arc<V>, size: u64) {
        self.state.lock().store(key, value, size);
    }

    /// Leaves a tombstone for `key` directly, without a store delete.
    pub fn mark_deleted(&self, key: K) {
        self.state.lock().mark_deleted(key);
    }

    pub fn evict_one_least_recently_used(&self) -> bool {
        self.state.lock().evict_one_least_recently_used()
    }

    /// Drops every entry without counting evictions.
    pub fn clear(&self) {
        self.state.lock().clear();
        info!("Cache cleared");
    }

    // == Telemetry ==
    pub fn entry_count(&self) -> usize {
        self.state.lock().entry_count()
    }

    /// Current running total of reported sizes.
    pub fn size(&self) -> u64 {
        self.state.lock().size()
    }

    pub fn max_size(&self) -> u64 {
        self.config.max_size()
    }

    pub fn hit_count(&self) -> u64 {
        self.stats.hits()
    }

    pub fn miss_count(&self) -> u64 {
        self.stats.misses()
    }

    pub fn retrieve_count(&self) -> u64 {
        self.stats.retrieves()
    }

    pub fn put_count(&self) -> u64 {
        self.stats.puts()
    }

    pub fn delete_count(&self) -> u64 {
        self.stats.deletes()
    }

    pub fn eviction_count(&self) -> u64 {
        self.stats.evictions()
    }

    /// Counters and occupancy captured together.
    pub fn stats(&self) -> StatsSnapshot {
        let state = self.state.lock();
        StatsSnapshot::capture(
            &self.stats,
            state.entry_count(),
            state.size(),
            self.config.max_size(),
        )
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TOMBSTONE_SIZE;
    use crate::error::CacheError;
    use std::cell::RefCell;

    type TestCache = ModelCache<&'static str, String>;

    fn cache(max_size: u64) -> TestCache {
        ModelCache::with_max_size(max_size).unwrap()
    }

    type Retrieved = std::result::Result<Option<SizedModel<String>>, CacheError>;

    fn found(value: &str, size: u64) -> Retrieved {
        Ok(Some(SizedModel::new(value.to_string(), size)))
    }

    fn absent() -> Retrieved {
        Ok(None)
    }

    fn written(_: &&'static str, value: &String) -> std::result::Result<u64, CacheError> {
        Ok(value.len() as u64)
    }

    #[test]
    fn test_zero_max_size_is_rejected() {
        assert!(matches!(
            TestCache::with_max_size(0),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_get_miss_populates_cache() {
        let cache = cache(100);

        let value = cache.get(&"x", ReadMode::Cached, || found("model", 10)).unwrap();
        assert_eq!(value.as_deref().map(String::as_str), Some("model"));
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.put_count(), 1);

        let mut called = false;
        let value = cache
            .get(&"x", ReadMode::Cached, || {
                called = true;
                absent()
            })
            .unwrap();
        assert!(!called);
        assert!(value.is_some());
        assert_eq!(cache.hit_count(), 1);
    }

    #[test]
    fn test_get_store_miss_leaves_tombstone() {
        let cache = cache(100);

        assert!(cache.get(&"ghost", ReadMode::Cached, absent).unwrap().is_none());
        assert!(cache.peek(&"ghost").is_deleted());
        assert_eq!(cache.size(), TOMBSTONE_SIZE);

        // Tombstone answers without the store.
        let result = cache.get(&"ghost", ReadMode::Cached, || found("late", 4));
        assert!(result.unwrap().is_none());
        assert_eq!(cache.hit_count(), 1);
    }

    #[test]
    fn test_get_skip_touches_nothing() {
        let cache = cache(100);
        cache.store("k", Arc::new("cached".to_string()), 6);

        let value = cache.get(&"k", ReadMode::Skip, || found("stored", 6)).unwrap();
        assert_eq!(value.as_deref().map(String::as_str), Some("stored"));

        assert_eq!(cache.retrieve_count(), 0);
        assert_eq!(cache.put_count(), 1);
        assert_eq!(
            cache.peek(&"k").value().map(|v| v.as_str().to_string()),
            Some("cached".to_string())
        );
    }

    #[test]
    fn test_get_refresh_always_retrieves() {
        let cache = cache(100);
        cache.store("k", Arc::new("old".to_string()), 3);

        let value = cache.get(&"k", ReadMode::Refresh, || found("new", 30)).unwrap();
        assert_eq!(value.as_deref().map(String::as_str), Some("new"));
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.put_count(), 2);
        assert_eq!(cache.size(), 30);
    }

    #[test]
    fn test_get_refresh_overwrites_tombstone() {
        let cache = cache(100);
        cache.mark_deleted("k");

        cache.get(&"k", ReadMode::Refresh, || found("back", 4)).unwrap();
        assert!(matches!(cache.peek(&"k"), CacheEntry::Cached { size: 4, .. }));
    }

    #[test]
    fn test_get_error_propagates_without_caching() {
        let cache = cache(100);

        let result: std::result::Result<_, CacheError> =
            cache.get(&"k", ReadMode::Cached, || Err(CacheError::Store("offline".into())));
        assert_eq!(result.unwrap_err(), CacheError::Store("offline".into()));
        assert!(!cache.peek(&"k").is_known());
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.put_count(), 0);
    }

    #[test]
    fn test_put_through_and_skip() {
        let cache = cache(100);

        cache
            .put("a", "alpha".to_string(), WriteMode::Through, written)
            .unwrap();
        assert!(matches!(cache.peek(&"a"), CacheEntry::Cached { size: 5, .. }));

        cache
            .put("b", "beta".to_string(), WriteMode::Skip, written)
            .unwrap();
        assert!(!cache.peek(&"b").is_known());
        assert_eq!(cache.put_count(), 1);
    }

    #[test]
    fn test_failed_put_does_not_cache() {
        let cache = cache(100);

        let result = cache.put("a", "alpha".to_string(), WriteMode::Through, |_, _| {
            Err(CacheError::Store("disk full".into()))
        });

        assert!(result.is_err());
        assert!(!cache.peek(&"a").is_known());
        assert_eq!(cache.put_count(), 0);
    }

    #[test]
    fn test_delete_leaves_tombstone() {
        let cache = cache(100);
        cache.store("k", Arc::new("v".to_string()), 10);

        cache
            .delete("k", WriteMode::Through, |_| Ok::<_, CacheError>(()))
            .unwrap();

        assert!(cache.lookup(&"k").is_deleted());
        assert_eq!(cache.size(), TOMBSTONE_SIZE);
        assert_eq!(cache.delete_count(), 1);
    }

    #[test]
    fn test_delete_skip_keeps_entry() {
        let cache = cache(100);
        cache.store("k", Arc::new("v".to_string()), 10);

        cache
            .delete("k", WriteMode::Skip, |_| Ok::<_, CacheError>(()))
            .unwrap();

        assert!(!cache.peek(&"k").is_known());
        assert_eq!(cache.delete_count(), 0);
        assert_eq!(cache.put_count(), 1);
    }

    #[test]
    fn test_new_copy_starts_empty_by_default() {
        let cache = cache(100);
        cache.store("a", Arc::new("a".to_string()), 10);
        cache.lookup(&"a");

        let copy = cache.new_copy(CopyMaxSize(50)).unwrap();

        assert_eq!(copy.max_size(), 50);
        assert_eq!(copy.entry_count(), 0);
        assert_eq!(copy.hit_count(), 0);
        assert_eq!(copy.put_count(), 0);
        // The source is untouched.
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.max_size(), 100);
    }

    #[test]
    fn test_new_copy_then_trim() {
        let config = CacheConfig::new(100)
            .unwrap()
            .with_copy_seeding(CopySeeding::CopyThenTrim);
        let cache: TestCache = ModelCache::new(config);
        cache.store("a", Arc::new("a".to_string()), 30);
        cache.store("b", Arc::new("b".to_string()), 30);
        cache.store("c", Arc::new("c".to_string()), 30);
        cache.lookup(&"a");

        let copy = cache.new_copy(CopyMaxSize(60)).unwrap();

        assert_eq!(copy.entry_count(), 2);
        assert_eq!(copy.size(), 60);
        assert!(copy.peek(&"a").is_known());
        assert!(copy.peek(&"c").is_known());
        assert!(!copy.peek(&"b").is_known());
        assert_eq!(copy.eviction_count(), 0);

        // Copies are independent.
        copy.mark_deleted("a");
        assert!(matches!(cache.peek(&"a"), CacheEntry::Cached { .. }));
    }

    #[test]
    fn test_new_copy_rejects_zero() {
        let cache = cache(100);
        assert!(cache.new_copy(CopyMaxSize(0)).is_err());
    }

    #[test]
    fn test_stats_snapshot() {
        let cache = cache(100);
        cache.store("a", Arc::new("a".to_string()), 10);
        cache.lookup(&"a");
        cache.lookup(&"b");

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.size, 10);
        assert_eq!(stats.max_size, 100);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.retrieves, 2);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_does_not_count_evictions() {
        let cache = cache(100);
        cache.store("a", Arc::new("a".to_string()), 10);
        cache.clear();

        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.eviction_count(), 0);
    }

    type Written = std::result::Result<u64, CacheError>;

    #[test]
    fn test_nested_puts_leave_cache_matching_store() {
        let cache = cache(100);
        let stored = RefCell::new(String::new());

        cache
            .put("k", "v1".to_string(), WriteMode::Through, |_, value| -> Written {
                *stored.borrow_mut() = value.clone();
                cache.put("k", "v2".to_string(), WriteMode::Through, |_, value| -> Written {
                    *stored.borrow_mut() = value.clone();
                    Ok(2)
                })?;
                Ok(2)
            })
            .unwrap();

        assert_eq!(*stored.borrow(), "v2");
        assert!(!cache.peek(&"k").is_known());
        assert_eq!(cache.state.lock().in_flight_count(), 0);

        let cached = cache
            .get(&"k", ReadMode::Cached, || found(&stored.borrow(), 2))
            .unwrap();
        assert_eq!(cached.as_deref().map(String::as_str), Some("v2"));
        assert_eq!(cache.put_count(), 1);
    }

    #[test]
    fn test_refresh_overtaken_by_put_keeps_put() {
        let cache = cache(100);
        let stored = RefCell::new("v0".to_string());

        let value = cache
            .get(&"k", ReadMode::Refresh, || -> Retrieved {
                let read = stored.borrow().clone();
                cache.put("k", "v1".to_string(), WriteMode::Through, |_, value| -> Written {
                    *stored.borrow_mut() = value.clone();
                    Ok(2)
                })?;
                found(&read, 2)
            })
            .unwrap();

        assert_eq!(value.as_deref().map(String::as_str), Some("v0"));
        assert_eq!(*stored.borrow(), "v1");
        let cached = cache.get(&"k", ReadMode::Cached, absent).unwrap();
        assert_eq!(cached.as_deref().map(String::as_str), Some("v1"));
    }

    #[test]
    fn test_put_inside_delete_invalidates() {
        let cache = cache(100);
        cache.store("k", Arc::new("old".to_string()), 3);

        cache
            .delete("k", WriteMode::Through, |_| -> std::result::Result<(), CacheError> {
                cache.put("k", "back".to_string(), WriteMode::Through, written)?;
                Ok(())
            })
            .unwrap();

        assert!(!cache.peek(&"k").is_known());
        assert_eq!(cache.delete_count(), 0);
        assert_eq!(cache.put_count(), 1);
    }

    #[test]
    fn test_put_overtaken_by_failed_put_drops_entry() {
        let cache = cache(100);
        cache.store("k", Arc::new("old".to_string()), 3);

        cache
            .put("k", "v1".to_string(), WriteMode::Through, |_, _| -> Written {
                let failed = cache.put("k", "v2".to_string(), WriteMode::Through, |_, _| {
                    Err(CacheError::Store("offline".into()))
                });
                assert!(failed.is_err());
                Ok(2)
            })
            .unwrap();

        // Neither write may leave "old" behind; the next read goes to the store.
        assert!(!cache.peek(&"k").is_known());
    }

    #[test]
    fn test_cached_read_overtaken_by_put_is_not_populated() {
        let cache = cache(100);

        let value = cache
            .get(&"k", ReadMode::Cached, || -> Retrieved {
                cache.put("k", "v1".to_string(), WriteMode::Through, written)?;
                absent()
            })
            .unwrap();

        assert!(value.is_none());
        assert!(matches!(cache.peek(&"k"), CacheEntry::Cached { .. }));
    }

    #[test]
    fn test_failed_calls_release_tickets() {
        let cache = cache(100);

        let _ = cache.get(&"k", ReadMode::Refresh, || -> Retrieved {
            Err(CacheError::Store("offline".into()))
        });
        let _ = cache.put("k", "v".to_string(), WriteMode::Through, |_, _| -> Written {
            Err(CacheError::Store("offline".into()))
        });
        let _ = cache.delete("k", WriteMode::Through, |_| Err(CacheError::Store("offline".into())));

        assert_eq!(cache.state.lock().in_flight_count(), 0);
        assert!(!cache.peek(&"k").is_known());
    }

    #[test]
    fn test_huge_size_hint_through_put() {
        let cache = cache(100);

        cache
            .put("huge", "h".to_string(), WriteMode::Through, |_, _| -> Written {
                Ok(u64::MAX)
            })
            .unwrap();
        cache
            .put("small", "s".to_string(), WriteMode::Through, written)
            .unwrap();

        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.eviction_count(), 1);
    }
}
