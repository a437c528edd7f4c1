//! Application state and sub-state extractors.
//!
//! Handlers extract only the sub-state they need via Axum's `FromRef`.

use std::sync::Arc;
use tutora_core::Config;
use tutora_upload::UploadPipeline;

/// The upload pipeline shared by every upload route.
#[derive(Clone)]
pub struct UploadState {
    pub pipeline: Arc<UploadPipeline>,
}

/// Bearer credential accepted by the upload routes.
#[derive(Clone)]
pub struct AuthState {
    pub api_token: Arc<str>,
}

pub struct AppState {
    pub upload: UploadState,
    pub auth: AuthState,
    pub config: Config,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for UploadState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.upload.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for AuthState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.auth.clone()
    }
}
