//! In-memory durable store.
//!
//! Used for `STORAGE_BACKEND=memory` and in tests. Availability can be
//! toggled to simulate an unreachable object store.

use crate::traits::{DurableStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

pub struct MemoryStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
    available: AtomicBool,
    probe_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            probe_count: AtomicUsize::new(0),
        }
    }

    /// Mark the store reachable or unreachable. While unreachable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of `ensure_bucket` calls so far.
    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    pub async fn get(&self, object_name: &str) -> Option<StoredObject> {
        self.objects.read().await.get(object_name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StorageError::Unreachable(
                "memory store marked unavailable".to_string(),
            ))
        }
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn ensure_bucket(&self) -> StorageResult<()> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()
    }

    async fn put_file(
        &self,
        object_name: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String> {
        self.check_available()?;
        let data = tokio::fs::read(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let size = data.len();

        self.objects.write().await.insert(
            object_name.to_string(),
            StoredObject {
                data: Bytes::from(data),
                content_type: content_type.to_string(),
            },
        );

        tracing::info!(
            object_name = %object_name,
            size_bytes = size,
            "Memory store upload successful"
        );

        Ok(self.object_url(object_name))
    }

    async fn exists(&self, object_name: &str) -> StorageResult<bool> {
        self.check_available()?;
        Ok(self.objects.read().await.contains_key(object_name))
    }

    async fn delete(&self, object_name: &str) -> StorageResult<()> {
        self.check_available()?;
        self.objects.write().await.remove(object_name);
        Ok(())
    }

    fn base_url(&self) -> String {
        self.base_url.clone()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_file_stores_bytes_and_returns_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        tokio::fs::write(&path, b"video bytes").await.unwrap();

        let store = MemoryStore::new("http://localhost:9000/videos");
        let url = store.put_file("clip.mp4", &path, "video/mp4").await.unwrap();

        assert_eq!(url, "http://localhost:9000/videos/clip.mp4");
        let stored = store.get("clip.mp4").await.unwrap();
        assert_eq!(stored.data.as_ref(), b"video bytes");
        assert_eq!(stored.content_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_unavailable_store_rejects_calls() {
        let store = MemoryStore::new("http://localhost:9000/videos");
        store.set_available(false);

        assert!(matches!(
            store.ensure_bucket().await,
            Err(StorageError::Unreachable(_))
        ));
        assert_eq!(store.probe_count(), 1);

        store.set_available(true);
        assert!(store.ensure_bucket().await.is_ok());
    }
}
