//! Request DTOs for the model cache API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{ReadMode, WriteMode};

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the PUT operation (PUT /models)
///
/// # Fields
/// - `key`: The key to store the model under
/// - `value`: The model, any JSON value
/// - `mode`: `through` (default) or `skip`
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The model key
    pub key: String,
    /// The model to store
    pub value: Value,
    /// Whether the cache is updated along with the store
    #[serde(default)]
    pub mode: WriteMode,
}

impl PutRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Validates a model key, returning an error message if it is unusable.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Query string for reads (GET /models/:key?mode=...)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ReadQuery {
    #[serde(default)]
    pub mode: ReadMode,
}

/// Query string for deletes (DELETE /models/:key?mode=...)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WriteQuery {
    #[serde(default)]
    pub mode: WriteMode,
}

/// Request body for the resize operation (POST /resize)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResizeRequest {
    /// New cache bound in bytes
    pub max_size: u64,
}
