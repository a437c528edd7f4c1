//! OpenAPI documentation.
//! API version is in `crate::constants::API_VERSION`.
//! Paths in handler annotations use placeholder /api/v0; they are transformed at runtime to the actual version.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::constants::API_VERSION;
use crate::error;
use crate::handlers;
use tutora_core::models;

/// Placeholder version used in handler path annotations (utoipa requires compile-time literals).
/// Replaced at runtime in the served OpenAPI spec with API_VERSION.
const OPENAPI_PATH_PLACEHOLDER: &str = "/api/v0";

/// Transforms path keys in the OpenAPI spec from placeholder to actual API version.
fn transform_openapi_paths(spec: &mut utoipa::openapi::OpenApi, version: &str) {
    let replacement = format!("/api/{}", version);
    if OPENAPI_PATH_PLACEHOLDER == replacement {
        return;
    }
    let path_map = std::mem::take(&mut spec.paths.paths);
    for (key, item) in path_map {
        let new_key = key.replacen(OPENAPI_PATH_PLACEHOLDER, &replacement, 1);
        spec.paths.paths.insert(new_key, item);
    }
}

/// Returns the OpenAPI spec with path placeholders replaced by the current API version.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    transform_openapi_paths(&mut spec, API_VERSION);
    spec
}

struct BearerAuthAddon;

impl Modify for BearerAuthAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tutora Upload API",
        version = "0.1.0",
        description = "Chunked video upload for course content (v0). Chunks are staged on disk, reassembled on the final chunk and published to the object store, falling back to local serving when the store is unreachable. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::video_upload::upload_chunk,
        handlers::upload_sessions::start_upload,
        handlers::upload_sessions::get_upload_progress,
        handlers::upload_sessions::abort_upload,
    ),
    components(
        schemas(
            models::FileDescriptor,
            models::StorageMode,
            models::ChunkReceivedResponse,
            models::UploadCompleteResponse,
            models::StartUploadRequest,
            models::StartUploadResponse,
            models::UploadProgressResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuthAddon),
    tags(
        (name = "videos", description = "Chunked video upload"),
        (name = "uploads", description = "Upload sessions for collision-free chunked uploads")
    )
)]
pub struct ApiDoc;
