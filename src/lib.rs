//! Tenant Cache - A multi-tenant, TTL-aware cache layer
//!
//! Stores opaque payloads per (tenant, client) namespace on top of a
//! transactional keyed store, with absolute and sliding expiration evaluated
//! lazily on access.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod partition;
pub mod service;
pub mod store;

pub use api::AppState;
pub use config::Config;
pub use service::CacheService;
