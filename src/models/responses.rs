//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing JSON response bodies. Payloads of GET
//! are returned as raw bytes and have no DTO.

use serde::Serialize;

/// Response body for the SET operation
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Number of payload bytes stored
    pub size: usize,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, size: usize) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            size,
        }
    }
}

/// Response body for the DELETE operation
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the REFRESH operation
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    /// Success message
    pub message: String,
    /// The key that was refreshed
    pub key: String,
}

impl RefreshResponse {
    /// Creates a new RefreshResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' refreshed", key),
            key,
        }
    }
}

/// Response body for the partition lookup
#[derive(Debug, Clone, Serialize)]
pub struct PartitionResponse {
    pub tenant_id: String,
    pub client_id: String,
    /// Routing key of the namespace
    pub partition_key: u32,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Reported once the service has been shut down
    pub fn shutting_down() -> Self {
        Self {
            status: "shutting_down".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
