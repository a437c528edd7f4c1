//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::{AppState, AuthState, UploadState};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tutora_core::Config;
use tutora_storage::DurableStore;
use tutora_upload::{prepare_staging, UploadPipeline};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Initialize the entire application
pub async fn initialize_app(
    config: Config,
) -> Result<(Arc<AppState>, axum::Router, Vec<JoinHandle<()>>)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let store = storage::setup_storage(&config).await?;

    build_app(config, store).await
}

/// Wire the pipeline, background tasks and router around an already built
/// durable store.
pub async fn build_app(
    config: Config,
    store: Option<Arc<dyn DurableStore>>,
) -> Result<(Arc<AppState>, axum::Router, Vec<JoinHandle<()>>)> {
    let pipeline = UploadPipeline::from_config(&config, store)
        .await
        .context("Failed to initialize upload pipeline")?;

    let removed = prepare_staging(
        pipeline.uploads(),
        pipeline.chunks(),
        config.clean_uploads_on_start(),
    )
    .await
    .context("Failed to prepare staging directories")?;
    tracing::info!(
        removed,
        upload_dir = %config.upload_dir().display(),
        chunk_dir = %config.chunk_dir().display(),
        "Staging directories ready"
    );

    let pipeline = Arc::new(pipeline);
    let sweeper = pipeline.clone().start_session_sweeper(SESSION_SWEEP_INTERVAL);

    let state = Arc::new(AppState {
        upload: UploadState { pipeline },
        auth: AuthState {
            api_token: Arc::from(config.api_token()),
        },
        config: config.clone(),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router, vec![sweeper]))
}
