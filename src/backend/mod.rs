//! Backing Store Module
//!
//! The contract the cache expects from the store behind it, and an in-memory
//! ordered implementation of it.

mod memory;

pub use memory::MemoryStore;

// == Sized Model ==
/// A materialized model together with the size of its stored representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedModel<V> {
    pub value: V,
    pub size: u64,
}

impl<V> SizedModel<V> {
    pub fn new(value: V, size: u64) -> Self {
        Self { value, size }
    }
}

// == Model Store ==
/// The durable source of truth sitting behind a cache.
///
/// Every call may fail independently; the cache hands those errors back to
/// its caller untouched.
pub trait ModelStore: Send + Sync {
    type Key;
    type Model;
    type Error;

    /// Reads and materializes the model stored under `key`, if any.
    fn retrieve(&self, key: &Self::Key) -> Result<Option<SizedModel<Self::Model>>, Self::Error>;

    /// Writes `model` under `key` and returns the size of what was written.
    fn write(&self, key: &Self::Key, model: &Self::Model) -> Result<u64, Self::Error>;

    /// Removes whatever is stored under `key`.
    fn delete(&self, key: &Self::Key) -> Result<(), Self::Error>;
}
