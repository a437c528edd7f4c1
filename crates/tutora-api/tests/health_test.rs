//! Health, readiness and OpenAPI integration tests.
//!
//! Run with: `cargo test -p tutora-api --test health_test`

mod helpers;

use helpers::{chunk_form, post_chunk, setup_test_app, setup_test_app_store_down};

#[tokio::test]
async fn test_health_reports_unknown_store_before_first_upload() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "unknown");
    assert_eq!(body["backend"], "memory");
    assert!(body["uploadDir"].as_str().unwrap().ends_with("uploads"));
}

#[tokio::test]
async fn test_health_reports_unavailable_store_after_fallback() {
    let app = setup_test_app_store_down().await;

    let upload = post_chunk(
        app.client(),
        chunk_form(vec![0u8; 16], 0, 1, "down.mp4", "video/mp4"),
    )
    .await;
    assert_eq!(upload.status_code(), 200);

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["storage"], "unavailable");
}

#[tokio::test]
async fn test_health_reports_available_store_after_durable_upload() {
    let app = setup_test_app().await;

    post_chunk(
        app.client(),
        chunk_form(vec![0u8; 16], 0, 1, "up.mp4", "video/mp4"),
    )
    .await;

    let body: serde_json::Value = app.client().get("/health").await.json();
    assert_eq!(body["storage"], "available");
}

#[tokio::test]
async fn test_liveness() {
    let app = setup_test_app().await;

    let response = app.client().get("/live").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_ignores_store_and_checks_staging() {
    let app = setup_test_app_store_down().await;

    let ready = app.client().get("/ready").await;
    assert_eq!(ready.status_code(), 200);

    std::fs::remove_dir_all(&app.chunk_dir).unwrap();
    let not_ready = app.client().get("/ready").await;
    assert_eq!(not_ready.status_code(), 503);
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert!(body["paths"].get("/api/v0/videos/upload").is_some());
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/live")
        .add_header("X-Request-ID", "req-123")
        .await;
    assert_eq!(response.header("X-Request-ID"), "req-123");
}
