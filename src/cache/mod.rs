//! Cache Module
//!
//! Namespaced, TTL-aware cache entries stored through a transactional store,
//! with lazy expiration on access.

mod entry;
mod namespace;
pub mod policy;
mod registry;
mod storage;


// Re-export public types
pub use entry::{CacheEntryMetadata, EntryOptions, NamespaceRegistryEntry};
pub use namespace::{CacheNamespace, REGISTRY_COLLECTION};
pub use registry::register_activity;
pub use storage::CacheStorage;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
