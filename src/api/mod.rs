//! API Module
//!
//! HTTP handlers and routing exposing the cache service.
//!
//! # Endpoints
//! - `GET|PUT|DELETE /cache/:tenant_id/:client_id/:key` - Fetch, store or delete an entry
//! - `POST /cache/:tenant_id/:client_id/:key/refresh` - Refresh an entry's last access
//! - `GET /partition/:tenant_id/:client_id` - Partition key of a namespace
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
