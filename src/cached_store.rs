//! Cached Store Module
//!
//! Binds a [`ModelCache`] to the [`ModelStore`] it fronts.

use std::hash::Hash;
use std::sync::Arc;

use crate::backend::ModelStore;
use crate::cache::{CopyMaxSize, ModelCache, ReadMode, StatsSnapshot, WriteMode};
use crate::config::CacheConfig;
use crate::error::Result;

// == Cached Store ==
/// A model store read and written through a bounded cache.
///
/// The store is shared; the cache belongs to this instance alone.
pub struct CachedStore<S: ModelStore> {
    store: Arc<S>,
    cache: ModelCache<S::Key, S::Model>,
}

impl<S> CachedStore<S>
where
    S: ModelStore,
    S::Key: Eq + Hash + Clone,
{
    // == Constructor ==
    pub fn new(store: Arc<S>, config: CacheConfig) -> Self {
        Self {
            store,
            cache: ModelCache::new(config),
        }
    }

    // == Get ==
    /// Reads the model stored under `key`.
    pub fn get(
        &self,
        key: &S::Key,
        mode: ReadMode,
    ) -> std::result::Result<Option<Arc<S::Model>>, S::Error> {
        self.cache.get(key, mode, || self.store.retrieve(key))
    }

    // == Put ==
    /// Writes `model` to the store, then to the cache unless skipped.
    pub fn put(
        &self,
        key: S::Key,
        model: S::Model,
        mode: WriteMode,
    ) -> std::result::Result<(), S::Error> {
        self.cache
            .put(key, model, mode, |key, model| self.store.write(key, model))
    }

    // == Delete ==
    /// Deletes `key` from the store, then tombstones it unless skipped.
    pub fn delete(&self, key: S::Key, mode: WriteMode) -> std::result::Result<(), S::Error> {
        self.cache.delete(key, mode, |key| self.store.delete(key))
    }

    // == New Copy ==
    /// Same store, fresh cache bounded by `copy_max_size`.
    pub fn new_copy(&self, copy_max_size: CopyMaxSize) -> Result<Self> {
        Ok(Self {
            store: Arc::clone(&self.store),
            cache: self.cache.new_copy(copy_max_size)?,
        })
    }

    pub fn cache(&self) -> &ModelCache<S::Key, S::Model> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.cache.stats()
    }
}
