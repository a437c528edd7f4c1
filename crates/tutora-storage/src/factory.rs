use crate::memory::MemoryStore;
#[cfg(feature = "storage-s3")]
use crate::S3Store;
use crate::{DurableStore, StorageBackend, StorageResult};
#[cfg(not(feature = "storage-s3"))]
use crate::StorageError;
use std::sync::Arc;
use tutora_core::Config;

/// Create the durable object store selected by `STORAGE_BACKEND`.
///
/// Returns `Ok(None)` for the `none` backend: every upload is then served
/// from the local upload directory.
pub async fn create_durable_store(config: &Config) -> StorageResult<Option<Arc<dyn DurableStore>>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let store = S3Store::new(config.store()).await?;
            Ok(Some(Arc::new(store)))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => {
            let base_url = format!(
                "{}/{}",
                config.store().public_base_url(),
                config.store().bucket
            );
            Ok(Some(Arc::new(MemoryStore::new(base_url))))
        }

        StorageBackend::None => Ok(None),
    }
}
