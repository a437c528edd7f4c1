//! Durable store setup

use anyhow::{Context, Result};
use std::sync::Arc;
use tutora_core::Config;
use tutora_storage::{create_durable_store, DurableStore};

/// Build the durable store client selected by `STORAGE_BACKEND`.
///
/// Only the client is constructed here. Reachability is probed lazily by the
/// publisher, so an object store that is down at startup does not stop the
/// service.
pub async fn setup_storage(config: &Config) -> Result<Option<Arc<dyn DurableStore>>> {
    tracing::info!(backend = %config.storage_backend(), "Initializing durable store...");

    let store = create_durable_store(config)
        .await
        .context("Failed to create durable store client")?;

    match &store {
        Some(store) => tracing::info!(
            backend = ?store.backend_type(),
            bucket = %config.store().bucket,
            endpoint = %config.store().endpoint_url(),
            "Durable store client initialized"
        ),
        None => tracing::warn!(
            "No durable store configured - uploads will be served from the local upload directory"
        ),
    }

    Ok(store)
}
