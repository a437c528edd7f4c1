//! Upload session handlers.
//!
//! A session fixes the object name and chunk count up front so that chunk
//! requests carrying its `uploadId` cannot collide with another upload of the
//! same file name.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::UploadState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tutora_core::models::{StartUploadRequest, StartUploadResponse, UploadProgressResponse};
use uuid::Uuid;

/// Open an upload session
#[utoipa::path(
    post,
    path = "/api/v0/videos/uploads",
    tag = "uploads",
    request_body = StartUploadRequest,
    responses(
        (status = 201, description = "Upload session created", body = StartUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn start_upload(
    State(state): State<UploadState>,
    ValidatedJson(request): ValidatedJson<StartUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.pipeline.start_session(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get upload session progress
#[utoipa::path(
    get,
    path = "/api/v0/videos/uploads/{upload_id}",
    tag = "uploads",
    params(
        ("upload_id" = Uuid, Path, description = "Upload session ID")
    ),
    responses(
        (status = 200, description = "Upload progress", body = UploadProgressResponse),
        (status = 404, description = "Upload session not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_upload_progress(
    State(state): State<UploadState>,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<UploadProgressResponse>, HttpAppError> {
    let progress = state.pipeline.session_progress(upload_id).await?;
    Ok(Json(progress))
}

/// Abort an upload session and discard its staged chunks
#[utoipa::path(
    delete,
    path = "/api/v0/videos/uploads/{upload_id}",
    tag = "uploads",
    params(
        ("upload_id" = Uuid, Path, description = "Upload session ID")
    ),
    responses(
        (status = 204, description = "Upload session aborted"),
        (status = 404, description = "Upload session not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn abort_upload(
    State(state): State<UploadState>,
    Path(upload_id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.pipeline.abort_session(upload_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
