//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, partition_handler, refresh_handler, set_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache/:tenant_id/:client_id/:key` - Fetch a payload
/// - `PUT /cache/:tenant_id/:client_id/:key` - Store a payload
/// - `DELETE /cache/:tenant_id/:client_id/:key` - Delete an entry
/// - `POST /cache/:tenant_id/:client_id/:key/refresh` - Refresh last access
/// - `GET /partition/:tenant_id/:client_id` - Partition key of a namespace
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache/:tenant_id/:client_id/:key",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .route(
            "/cache/:tenant_id/:client_id/:key/refresh",
            post(refresh_handler),
        )
        .route("/partition/:tenant_id/:client_id", get(partition_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
