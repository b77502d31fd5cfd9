//! Cache Entry Module
//!
//! Defines the persisted records of the cache: per-key metadata, the
//! namespace registry entry, and the expiration options supplied on write.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Entry Options ==
/// Expiration settings supplied with a `set`.
///
/// Unset fields leave an existing entry's stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Fixed point in time after which the entry is dead
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Absolute bound expressed relative to the entry's creation
    pub absolute_expiration_relative_to_now: Option<Duration>,
    /// Lifetime bound measured from creation
    pub sliding_expiration: Option<Duration>,
}

impl EntryOptions {
    /// Options with no expiration at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an absolute expiration timestamp.
    pub fn with_absolute_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.absolute_expiration = Some(at);
        self
    }

    /// Sets an absolute expiration relative to creation.
    pub fn with_absolute_expiration_relative_to_now(mut self, after: Duration) -> Self {
        self.absolute_expiration_relative_to_now = Some(after);
        self
    }

    /// Sets a sliding expiration.
    pub fn with_sliding_expiration(mut self, window: Duration) -> Self {
        self.sliding_expiration = Some(window);
        self
    }
}

// == Cache Entry Metadata ==
/// Per-key metadata stored next to the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntryMetadata {
    pub absolute_expiration: Option<DateTime<Utc>>,
    pub absolute_expiration_relative_to_now: Option<Duration>,
    pub sliding_expiration: Option<Duration>,
    /// When the key was first written
    pub created: DateTime<Utc>,
    /// Last write or successful read
    pub last_accessed: DateTime<Utc>,
    /// Payload length in bytes
    pub size: Option<u64>,
}

impl CacheEntryMetadata {
    // == Constructor ==
    /// Creates metadata for a key written for the first time at `now`.
    pub fn new(options: &EntryOptions, size: u64, now: DateTime<Utc>) -> Self {
        Self {
            absolute_expiration: options.absolute_expiration,
            absolute_expiration_relative_to_now: options.absolute_expiration_relative_to_now,
            sliding_expiration: options.sliding_expiration,
            created: now,
            last_accessed: now,
            size: Some(size),
        }
    }

    // == Merge ==
    /// Applies a rewrite of an existing key.
    ///
    /// Only expiration fields present in `options` replace stored ones;
    /// `size` and `last_accessed` always move to the new write. `created`
    /// is kept.
    pub fn merged(&self, options: &EntryOptions, size: u64, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(at) = options.absolute_expiration {
            next.absolute_expiration = Some(at);
        }
        if let Some(after) = options.absolute_expiration_relative_to_now {
            next.absolute_expiration_relative_to_now = Some(after);
        }
        if let Some(window) = options.sliding_expiration {
            next.sliding_expiration = Some(window);
        }
        next.size = Some(size);
        next.last_accessed = now;
        next
    }

    /// Returns a copy with `last_accessed` moved to `now`.
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            last_accessed: now,
            ..self.clone()
        }
    }
}

// == Namespace Registry Entry ==
/// Bookkeeping record for a namespace that has been written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRegistryEntry {
    pub tenant_id: String,
    pub client_id: String,
    pub last_access: DateTime<Utc>,
}
