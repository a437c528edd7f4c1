//! Storage abstraction trait
//!
//! This module defines the DurableStore trait that every object-store backend implements.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Store unreachable: {0}")]
    Unreachable(String),

    #[error("Bucket provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable object store abstraction
///
/// A reassembled upload is pushed to a `DurableStore` under its object name.
/// Implementations do not apply timeouts themselves; the publisher bounds
/// every call.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Probe connectivity by checking that the bucket exists, creating it
    /// (and applying the public policy, when configured) if it does not.
    async fn ensure_bucket(&self) -> StorageResult<()>;

    /// Upload the file at `path` under `object_name`, returning the object URL.
    /// Overwrites an existing object of the same name.
    async fn put_file(
        &self,
        object_name: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Check if an object exists
    async fn exists(&self, object_name: &str) -> StorageResult<bool>;

    /// Delete an object
    async fn delete(&self, object_name: &str) -> StorageResult<()>;

    /// Canonical URL of an object: `{base_url}/{object_name}`
    fn object_url(&self, object_name: &str) -> String {
        format!(
            "{}/{}",
            self.base_url().trim_end_matches('/'),
            urlencoding::encode(object_name)
        )
    }

    /// Base URL of the bucket: `{scheme}://{host}[:port]/{bucket}`
    fn base_url(&self) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
