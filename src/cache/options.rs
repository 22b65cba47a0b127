//! Per-call Options Module
//!
//! Read and write modes passed explicitly with each cache operation, and the
//! plans they resolve to.

use serde::Deserialize;

// == Read Mode ==
/// How a read treats the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Consult the cache, populating it from the store on a miss
    #[default]
    Cached,
    /// Read straight from the store; the cache is neither read nor written
    Skip,
    /// Always read from the store, then overwrite the cached entry
    Refresh,
}

// == Write Mode ==
/// How a write or delete treats the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Update the store, then mirror the change in the cache
    #[default]
    Through,
    /// Update the store only; the cache is neither populated nor invalidated
    Skip,
}

/// Bound for a cache produced by `ModelCache::new_copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyMaxSize(pub u64);

// == Plans ==
/// What a read does, resolved from its [`ReadMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPlan {
    /// Go to the store only
    Bypass,
    /// Look up; on a miss, retrieve and populate
    LookupThenPopulate,
    /// Look up for instrumentation, then retrieve and overwrite
    FetchAndOverwrite,
}

/// What a write or delete does, resolved from its [`WriteMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    Bypass,
    Through,
}

impl ReadMode {
    pub fn plan(self) -> ReadPlan {
        match self {
            ReadMode::Cached => ReadPlan::LookupThenPopulate,
            ReadMode::Skip => ReadPlan::Bypass,
            ReadMode::Refresh => ReadPlan::FetchAndOverwrite,
        }
    }
}

impl WriteMode {
    pub fn plan(self) -> WritePlan {
        match self {
            WriteMode::Through => WritePlan::Through,
            WriteMode::Skip => WritePlan::Bypass,
        }
    }
}
