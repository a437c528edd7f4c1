//! Chunked video upload handler.
//!
//! One multipart request per chunk. Non-final chunks are acknowledged; the
//! final chunk triggers reassembly and publishing and returns the file
//! descriptor.

use crate::constants::{
    CHUNK_FIELD, ORIGINAL_NAME_FIELD, TOTAL_CHUNKS_FIELD, UPLOAD_ID_FIELD, VIDEO_FIELD,
};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::UploadState;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;
use tutora_core::models::UploadCompleteResponse;
use tutora_upload::{ChunkFields, ChunkOutcome, ChunkRequest};

#[utoipa::path(
    post,
    path = "/api/v0/videos/upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields: video (binary), chunk, totalChunks, originalname, uploadId (optional)"),
    responses(
        (status = 200, description = "Final chunk stored, file reassembled and published. Non-final chunks answer with ChunkReceivedResponse", body = UploadCompleteResponse),
        (status = 400, description = "Malformed chunk request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 404, description = "Unknown upload session", body = ErrorResponse),
        (status = 409, description = "Chunk does not match the upload session", body = ErrorResponse),
        (status = 413, description = "Chunk too large", body = ErrorResponse),
        (status = 500, description = "Chunk processing failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_chunk(
    State(state): State<UploadState>,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let started = Instant::now();
    let fields = read_chunk_fields(multipart).await?;
    let request = ChunkRequest::from_fields(fields)?;

    tracing::debug!(
        upload_key = %request.normalized_name,
        chunk_index = request.index,
        total_chunks = request.total_chunks,
        size_bytes = request.data.len(),
        upload_id = ?request.upload_id,
        "Chunk received"
    );

    let outcome = state.pipeline.handle_chunk(request).await?;

    let response = match outcome {
        ChunkOutcome::Received(ack) => Json(ack).into_response(),
        ChunkOutcome::Completed(done) => {
            tracing::info!(
                filename = %done.file.filename,
                size_bytes = done.file.size,
                storage = ?done.storage,
                duration_ms = started.elapsed().as_millis() as u64,
                "Final chunk processed"
            );
            Json(done).into_response()
        }
    };

    Ok(response)
}

/// Collect the chunk fields from the multipart body.
///
/// Unknown fields are drained and ignored. When `originalname` is absent the
/// file name of the binary part is used.
async fn read_chunk_fields(mut multipart: Multipart) -> Result<ChunkFields, HttpAppError> {
    let mut fields = ChunkFields::default();
    let mut part_file_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            VIDEO_FIELD => {
                fields.content_type = field.content_type().map(str::to_string);
                part_file_name = field.file_name().map(str::to_string);
                fields.data = Some(field.bytes().await?);
            }
            CHUNK_FIELD => fields.chunk = Some(field.text().await?),
            TOTAL_CHUNKS_FIELD => fields.total_chunks = Some(field.text().await?),
            ORIGINAL_NAME_FIELD => fields.original_name = Some(field.text().await?),
            UPLOAD_ID_FIELD => fields.upload_id = Some(field.text().await?),
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
                field.bytes().await?;
            }
        }
    }

    if fields.original_name.is_none() {
        fields.original_name = part_file_name;
    }

    Ok(fields)
}
