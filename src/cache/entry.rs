//! Cache Entry Module
//!
//! Defines the outcome of a cache lookup: a live model, a deletion tombstone,
//! or no entry at all.

use std::sync::Arc;

/// Reported size of a deletion tombstone.
pub const TOMBSTONE_SIZE: u64 = 8;

/// Largest size an entry is accounted at. Larger hints are clamped so the
/// running total of a bounded cache cannot overflow.
pub const MAX_ENTRY_SIZE: u64 = u64::MAX >> 2;

// == Cache Entry ==
/// What the cache knows about a key.
///
/// `Deleted` is a definitive negative answer ("known absent"), while
/// `NotInCache` means the cache has no knowledge of the key.
#[derive(Debug)]
pub enum CacheEntry<V> {
    /// A materialized model and its reported size (always > 0)
    Cached { value: Arc<V>, size: u64 },
    /// The key was deleted, or the store reported it absent
    Deleted,
    /// The cache holds nothing for this key
    NotInCache,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a `Cached` entry.
    ///
    /// A size hint of zero is accounted as one byte so every live entry
    /// occupies space; hints above [`MAX_ENTRY_SIZE`] are accounted at it.
    pub fn cached(value: Arc<V>, size: u64) -> Self {
        CacheEntry::Cached {
            value,
            size: size.clamp(1, MAX_ENTRY_SIZE),
        }
    }

    // == Size ==
    /// Reported size used for the running total.
    pub fn size(&self) -> u64 {
        match self {
            CacheEntry::Cached { size, .. } => *size,
            CacheEntry::Deleted => TOMBSTONE_SIZE,
            CacheEntry::NotInCache => 0,
        }
    }

    // == Value ==
    /// The cached model, present only for `Cached`.
    pub fn value(&self) -> Option<&Arc<V>> {
        match self {
            CacheEntry::Cached { value, .. } => Some(value),
            CacheEntry::Deleted | CacheEntry::NotInCache => None,
        }
    }

    /// Consumes the entry, returning the model if it was `Cached`.
    pub fn into_value(self) -> Option<Arc<V>> {
        match self {
            CacheEntry::Cached { value, .. } => Some(value),
            CacheEntry::Deleted | CacheEntry::NotInCache => None,
        }
    }

    /// True for `Cached` and `Deleted`, the two answers that count as a hit.
    pub fn is_known(&self) -> bool {
        !matches!(self, CacheEntry::NotInCache)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, CacheEntry::Deleted)
    }
}

// Manual impl: deriving would require `V: Clone`, but only the `Arc` is cloned.
impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        match self {
            CacheEntry::Cached { value, size } => CacheEntry::Cached {
                value: Arc::clone(value),
                size: *size,
            },
            CacheEntry::Deleted => CacheEntry::Deleted,
            CacheEntry::NotInCache => CacheEntry::NotInCache,
        }
    }
}
