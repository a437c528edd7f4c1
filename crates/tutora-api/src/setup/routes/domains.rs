//! Upload route groups.

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn video_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/videos/upload", API_PREFIX),
            post(handlers::video_upload::upload_chunk),
        )
        .with_state(state)
}

pub fn upload_session_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/videos/uploads", API_PREFIX),
            post(handlers::upload_sessions::start_upload),
        )
        .route(
            &format!("{}/videos/uploads/{{upload_id}}", API_PREFIX),
            get(handlers::upload_sessions::get_upload_progress)
                .delete(handlers::upload_sessions::abort_upload),
        )
        .with_state(state)
}
