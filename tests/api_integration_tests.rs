//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::{TimeDelta, Utc};
use serde_json::Value;
use tenant_cache::{
    api::create_router,
    cache::{CacheEntryMetadata, CacheNamespace, REGISTRY_COLLECTION},
    partition::partition_key_str,
    store::MemoryStore,
    AppState, CacheService,
};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let service = CacheService::new(Arc::new(store.clone()));
    (create_router(AppState::new(service)), store)
}

async fn send(app: &Router, method: &str, uri: &str, body: impl Into<Body>) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_to_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn stored_meta(store: &MemoryStore, key: &str) -> CacheEntryMetadata {
    let ns = CacheNamespace::new("acme", "web");
    serde_json::from_slice(&store.peek(&ns.metadata_collection(), key).unwrap()).unwrap()
}

// == SET / GET ==

#[tokio::test]
async fn test_set_then_get_returns_exact_bytes() {
    let (app, _) = create_test_app();
    let payload: Vec<u8> = vec![0, 159, 146, 150, 255, 10];

    let response = send(&app, "PUT", "/cache/acme/web/blob", payload.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["key"], "blob");
    assert_eq!(json["size"], 6);

    let response = send(&app, "GET", "/cache/acme/web/blob", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response).await, payload);
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let (app, _) = create_test_app();

    let response = send(&app, "GET", "/cache/acme/web/missing", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_namespaces_do_not_share_keys() {
    let (app, _) = create_test_app();
    send(&app, "PUT", "/cache/acme/web/k", "web").await;

    let response = send(&app, "GET", "/cache/acme/mobile/k", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_set_registers_namespace() {
    let (app, store) = create_test_app();
    send(&app, "PUT", "/cache/acme/web/k", "v").await;

    let ns = CacheNamespace::new("acme", "web");
    assert!(store.peek(REGISTRY_COLLECTION, &ns.registry_key()).is_some());
}

// == Expiration ==

#[tokio::test]
async fn test_set_with_expiration_options() {
    let (app, store) = create_test_app();
    let absolute = (Utc::now() + TimeDelta::hours(1)).format("%Y-%m-%dT%H:%M:%SZ");

    let uri = format!(
        "/cache/acme/web/k?absolute_expiration={absolute}&sliding_expiration_ms=60000"
    );
    let response = send(&app, "PUT", &uri, "v").await;
    assert_eq!(response.status(), StatusCode::OK);

    let meta = stored_meta(&store, "k");
    assert!(meta.absolute_expiration.is_some());
    assert_eq!(meta.sliding_expiration.unwrap().as_secs(), 60);
}

#[tokio::test]
async fn test_partial_update_keeps_previous_sliding() {
    let (app, store) = create_test_app();
    let absolute = (Utc::now() + TimeDelta::hours(1)).format("%Y-%m-%dT%H:%M:%SZ");

    send(&app, "PUT", "/cache/acme/web/k?sliding_expiration_ms=5000", "v1").await;
    let uri = format!("/cache/acme/web/k?absolute_expiration={absolute}");
    send(&app, "PUT", &uri, "v2").await;

    let meta = stored_meta(&store, "k");
    assert_eq!(meta.sliding_expiration.unwrap().as_secs(), 5);
    assert!(meta.absolute_expiration.is_some());
}

#[tokio::test]
async fn test_sub_second_lifetime_is_evicted_on_get() {
    let (app, store) = create_test_app();
    let ns = CacheNamespace::new("acme", "web");

    let response = send(
        &app,
        "PUT",
        "/cache/acme/web/short?absolute_expiration_relative_to_now_ms=500",
        "v",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/cache/acme/web/short", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(store.peek(&ns.metadata_collection(), "short").is_none());
    assert!(store.peek(&ns.data_collection(), "short").is_none());
}

#[tokio::test]
async fn test_past_absolute_expiration_is_rejected() {
    let (app, _) = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/cache/acme/web/k?absolute_expiration=2000-01-01T00:00:00Z",
        "v",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response).await;
    assert_eq!(json["retryable"], false);

    let response = send(&app, "GET", "/cache/acme/web/k", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_query_is_rejected() {
    let (app, _) = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/cache/acme/web/k?sliding_expiration_ms=soon",
        "v",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == DELETE / REFRESH ==

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (app, _) = create_test_app();
    send(&app, "PUT", "/cache/acme/web/k", "v").await;

    for _ in 0..2 {
        let response = send(&app, "DELETE", "/cache/acme/web/k", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", "/cache/acme/web/k", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_refresh_moves_last_access() {
    let (app, store) = create_test_app();
    send(&app, "PUT", "/cache/acme/web/k", "v").await;
    let before = stored_meta(&store, "k").last_accessed;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let response = send(&app, "POST", "/cache/acme/web/k/refresh", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(stored_meta(&store, "k").last_accessed > before);
}

// == Failures ==

#[tokio::test]
async fn test_storage_outage_is_not_a_miss() {
    let (app, store) = create_test_app();
    send(&app, "PUT", "/cache/acme/web/k", "v").await;
    store.set_offline(true);

    let response = send(&app, "GET", "/cache/acme/web/k", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response).await;
    assert_eq!(json["retryable"], true);
}

// == Partition / Health ==

#[tokio::test]
async fn test_partition_endpoint() {
    let (app, _) = create_test_app();

    let response = send(&app, "GET", "/partition/acme/web", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["tenant_id"], "acme");
    assert_eq!(json["client_id"], "web");
    assert_eq!(
        json["partition_key"].as_u64().unwrap(),
        u64::from(partition_key_str("C:Tacme:Cweb"))
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();

    let response = send(&app, "GET", "/health", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
