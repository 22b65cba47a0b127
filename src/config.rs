//! Configuration Module
//!
//! Handles cache sizing and seeding policy, and loading the server
//! configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::{CacheError, Result};

/// Default cache bound: 64 MiB of reported model size.
pub const DEFAULT_MAX_SIZE: u64 = 64 * 1024 * 1024;

/// Largest accepted cache bound. Together with the per-entry size clamp this
/// keeps the running total within `u64`.
pub const MAX_CACHE_SIZE: u64 = u64::MAX >> 1;

// == Copy Seeding ==
/// How a cache produced by `new_copy` is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopySeeding {
    /// The copy starts with no entries.
    #[default]
    Empty,
    /// The copy takes the source's entries in recency order, then trims them
    /// against its own bound.
    CopyThenTrim,
}

impl FromStr for CopySeeding {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "empty" => Ok(CopySeeding::Empty),
            "copy" | "copy-then-trim" => Ok(CopySeeding::CopyThenTrim),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown copy seeding '{}'",
                other
            ))),
        }
    }
}

// == Cache Config ==
/// Validated construction parameters for a `ModelCache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    max_size: u64,
    copy_seeding: CopySeeding,
}

impl CacheConfig {
    /// Creates a config with the given bound and empty copy seeding.
    ///
    /// A zero bound would evict everything on the first write, so it is
    /// rejected here instead, as is a bound above [`MAX_CACHE_SIZE`].
    pub fn new(max_size: u64) -> Result<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if max_size > MAX_CACHE_SIZE {
            return Err(CacheError::InvalidConfig(format!(
                "max_size must be at most {}",
                MAX_CACHE_SIZE
            )));
        }
        Ok(Self {
            max_size,
            copy_seeding: CopySeeding::Empty,
        })
    }

    /// Sets how `new_copy` seeds the copied cache.
    pub fn with_copy_seeding(mut self, copy_seeding: CopySeeding) -> Self {
        self.copy_seeding = copy_seeding;
        self
    }

    /// Same config with another bound, validated like [`CacheConfig::new`].
    pub fn with_max_size(self, max_size: u64) -> Result<Self> {
        Ok(Self::new(max_size)?.with_copy_seeding(self.copy_seeding))
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn copy_seeding(&self) -> CopySeeding {
        self.copy_seeding
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum total reported size of cached models
    pub max_size: u64,
    /// Seeding policy applied when the cache is resized
    pub copy_seeding: CopySeeding,
    /// HTTP server port
    pub server_port: u16,
    /// Stats reporter interval in seconds
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_SIZE` - Cache bound in bytes (default: 64 MiB)
    /// - `COPY_SEEDING` - `empty` or `copy` (default: empty)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STATS_INTERVAL` - Stats report frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env::var("MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            copy_seeding: env::var("COPY_SEEDING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.copy_seeding),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            stats_interval: env::var("STATS_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.stats_interval),
        }
    }

    /// Validated cache parameters for this server configuration.
    pub fn cache_config(&self) -> Result<CacheConfig> {
        Ok(CacheConfig::new(self.max_size)?.with_copy_seeding(self.copy_seeding))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            copy_seeding: CopySeeding::Empty,
            server_port: 3000,
            stats_interval: 30,
        }
    }
}
