//! Error types for the cache
//!
//! Provides unified error handling using thiserror. A cache miss is not an
//! error; engine operations return `Ok(None)` for it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Expiration settings that can never describe a live entry
    #[error("Invalid expiration configuration: {0}")]
    Configuration(String),

    /// The store timed out, conflicted or could not be reached; retryable
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The operation was aborted by its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Key not found (transport rendering of a miss)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// True for failures a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::StorageUnavailable(_))
    }
}

// == Conversions ==
impl From<StoreError> for CacheError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Cancelled => CacheError::Cancelled,
            StoreError::Corrupt(msg) => CacheError::Internal(msg),
            other => CacheError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Internal(format!("record encoding: {err}"))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Configuration(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "retryable": self.is_retryable(),
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
