//! In-memory ordered model store.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Serialize;

use crate::backend::{ModelStore, SizedModel};
use crate::error::CacheError;

// == Memory Store ==
/// A `BTreeMap`-backed store that sizes models by their JSON encoding.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    models: RwLock<BTreeMap<K, V>>,
}

impl<K: Ord, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self {
            models: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K, V> MemoryStore<K, V>
where
    K: Ord + Clone,
    V: Clone + Serialize,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of models stored.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> Vec<K> {
        self.models.read().keys().cloned().collect()
    }

    fn size_of(model: &V) -> Result<u64, CacheError> {
        serde_json::to_vec(model)
            .map(|bytes| bytes.len() as u64)
            .map_err(|e| CacheError::Store(format!("failed to encode model: {}", e)))
    }
}

impl<K, V> ModelStore for MemoryStore<K, V>
where
    K: Ord + Clone + Send + Sync,
    V: Clone + Serialize + Send + Sync,
{
    type Key = K;
    type Model = V;
    type Error = CacheError;

    fn retrieve(&self, key: &K) -> Result<Option<SizedModel<V>>, CacheError> {
        let models = self.models.read();
        match models.get(key) {
            Some(model) => Ok(Some(SizedModel::new(model.clone(), Self::size_of(model)?))),
            None => Ok(None),
        }
    }

    fn write(&self, key: &K, model: &V) -> Result<u64, CacheError> {
        let size = Self::size_of(model)?;
        self.models.write().insert(key.clone(), model.clone());
        Ok(size)
    }

    fn delete(&self, key: &K) -> Result<(), CacheError> {
        self.models.write().remove(key);
        Ok(())
    }
}
