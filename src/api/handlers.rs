//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::CacheNamespace;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, EntryPath, HealthResponse, PartitionResponse, RefreshResponse, SetQuery,
    SetResponse,
};
use crate::service::CacheService;
use crate::store::MemoryStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache façade over the in-process store
    pub service: CacheService<MemoryStore>,
}

impl AppState {
    /// Creates a new AppState with the given service.
    pub fn new(service: CacheService<MemoryStore>) -> Self {
        Self { service }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Backs the service with a fresh in-memory store.
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(CacheService::with_timeout(store, config.operation_timeout()))
    }
}

fn validated(path: EntryPath) -> Result<EntryPath> {
    match path.validate() {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(path),
    }
}

/// Handler for GET /cache/:tenant_id/:client_id/:key
///
/// Returns the raw payload, or 404 on a miss.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(path): Path<EntryPath>,
) -> Result<Response> {
    let path = validated(path)?;

    match state
        .service
        .get(&path.key, &path.tenant_id, &path.client_id)
        .await?
    {
        Some(payload) => Ok((
            [(header::CONTENT_TYPE, "application/octet-stream")],
            payload,
        )
            .into_response()),
        None => Err(CacheError::NotFound(path.key)),
    }
}

/// Handler for PUT /cache/:tenant_id/:client_id/:key
///
/// Stores the request body with the expiration options from the query.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(path): Path<EntryPath>,
    Query(query): Query<SetQuery>,
    body: Bytes,
) -> Result<Json<SetResponse>> {
    let path = validated(path)?;

    state
        .service
        .set(
            &path.key,
            &body,
            &query.into_options(),
            &path.tenant_id,
            &path.client_id,
        )
        .await?;

    Ok(Json(SetResponse::new(path.key, body.len())))
}

/// Handler for POST /cache/:tenant_id/:client_id/:key/refresh
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(path): Path<EntryPath>,
) -> Result<Json<RefreshResponse>> {
    let path = validated(path)?;

    state
        .service
        .refresh(&path.key, &path.tenant_id, &path.client_id)
        .await?;

    Ok(Json(RefreshResponse::new(path.key)))
}

/// Handler for DELETE /cache/:tenant_id/:client_id/:key
///
/// Succeeds whether or not the key existed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(path): Path<EntryPath>,
) -> Result<Json<DeleteResponse>> {
    let path = validated(path)?;

    state
        .service
        .delete(&path.key, &path.tenant_id, &path.client_id)
        .await?;

    Ok(Json(DeleteResponse::new(path.key)))
}

/// Handler for GET /partition/:tenant_id/:client_id
///
/// Reports the partition key a namespace routes to.
pub async fn partition_handler(
    Path((tenant_id, client_id)): Path<(String, String)>,
) -> Json<PartitionResponse> {
    let partition_key = CacheNamespace::new(tenant_id.as_str(), client_id.as_str()).partition_key();

    Json(PartitionResponse {
        tenant_id,
        client_id,
        partition_key,
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    if state.service.is_shut_down() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::shutting_down()),
        )
    } else {
        (StatusCode::OK, Json(HealthResponse::healthy()))
    }
}
