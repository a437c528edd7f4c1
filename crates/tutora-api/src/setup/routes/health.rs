//! Health check handlers and response types.

use crate::state::AppState;
use axum::{http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tutora_upload::StoreHealth;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns status string "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HealthCheckResponse {
    pub status: String,
    /// Last known state of the durable store
    pub storage: String,
    pub backend: String,
    pub upload_dir: String,
}

/// Liveness probe - process is running.
pub async fn liveness_check(_state: Arc<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - both staging directories are writable.
///
/// The durable store is not consulted: an unreachable store degrades uploads
/// to local serving but does not stop them.
pub async fn readiness_check(state: Arc<AppState>) -> impl IntoResponse {
    let pipeline = state.upload.pipeline.clone();

    let uploads = pipeline.uploads().clone();
    let upload_dir = run_check(
        TIMEOUT,
        async move { uploads.check_writable().await },
        "not_ready",
    )
    .await;

    let chunks = pipeline.chunks().clone();
    let chunk_dir = run_check(
        TIMEOUT,
        async move { chunks.check_writable().await },
        "not_ready",
    )
    .await;

    let ready = upload_dir == "healthy" && chunk_dir == "healthy";
    if !ready {
        tracing::error!(
            upload_dir = %upload_dir,
            chunk_dir = %chunk_dir,
            "Staging directory readiness check failed"
        );
    }

    let response = serde_json::json!({
        "status": if ready { "ready" } else { "not_ready" },
        "uploadDir": upload_dir,
        "chunkDir": chunk_dir,
    });

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// Process health with the last known durable-store state. Always 200.
pub async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    let pipeline = &state.upload.pipeline;
    let storage = pipeline.publisher().health();

    let status = match storage {
        StoreHealth::Unavailable => "degraded",
        StoreHealth::Available | StoreHealth::Unknown => "healthy",
    };

    let response = HealthCheckResponse {
        status: status.to_string(),
        storage: storage.as_str().to_string(),
        backend: state.config.storage_backend().to_string(),
        upload_dir: pipeline.uploads().base_path().display().to_string(),
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_check_reports_error_with_prefix() {
        let status = run_check(
            Duration::from_secs(1),
            async { Err::<(), _>("disk full") },
            "not_ready",
        )
        .await;
        assert_eq!(status, "not_ready: disk full");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_check_times_out() {
        let status = run_check(
            Duration::from_millis(10),
            async {
                std::future::pending::<()>().await;
                Ok::<(), String>(())
            },
            "not_ready",
        )
        .await;
        assert_eq!(status, "timeout");
    }
}
