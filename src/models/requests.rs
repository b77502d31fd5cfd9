//! Request DTOs for the cache server API
//!
//! Defines the path and query parameters of incoming HTTP requests.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::cache::{EntryOptions, MAX_KEY_LENGTH};

/// Path parameters addressing one cache entry
#[derive(Debug, Clone, Deserialize)]
pub struct EntryPath {
    pub tenant_id: String,
    pub client_id: String,
    pub key: String,
}

impl EntryPath {
    /// Validates the path segments
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.tenant_id.is_empty() {
            return Some("Tenant id cannot be empty".to_string());
        }
        if self.client_id.is_empty() {
            return Some("Client id cannot be empty".to_string());
        }
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Query parameters of the SET operation (PUT /cache/:tenant/:client/:key)
///
/// # Fields
/// - `absolute_expiration`: RFC 3339 timestamp after which the entry is dead
/// - `absolute_expiration_relative_to_now_ms`: absolute bound relative to creation
/// - `sliding_expiration_ms`: lifetime bound measured from creation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetQuery {
    #[serde(default)]
    pub absolute_expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub absolute_expiration_relative_to_now_ms: Option<u64>,
    #[serde(default)]
    pub sliding_expiration_ms: Option<u64>,
}

impl SetQuery {
    /// Converts the wire options into entry options
    pub fn into_options(self) -> EntryOptions {
        EntryOptions {
            absolute_expiration: self.absolute_expiration,
            absolute_expiration_relative_to_now: self
                .absolute_expiration_relative_to_now_ms
                .map(Duration::from_millis),
            sliding_expiration: self.sliding_expiration_ms.map(Duration::from_millis),
        }
    }
}
