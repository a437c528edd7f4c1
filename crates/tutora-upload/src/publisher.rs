use crate::health::{HealthEvent, PublishDecision, StoreHealth, StoreHealthTracker};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tutora_core::models::StorageMode;
use tutora_storage::{DurableStore, LocalStorage, StorageError};

/// Where a reassembled file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub mode: StorageMode,
    pub url: String,
    pub base_url: String,
}

/// Pushes reassembled files to the durable store, falling back to serving
/// them from the local upload directory.
pub struct Publisher {
    store: Option<Arc<dyn DurableStore>>,
    uploads: LocalStorage,
    health: StoreHealthTracker,
    probe_timeout: Duration,
    upload_timeout: Duration,
}

impl Publisher {
    pub fn new(
        store: Option<Arc<dyn DurableStore>>,
        uploads: LocalStorage,
        probe_timeout: Duration,
        upload_timeout: Duration,
        recheck_interval: Duration,
    ) -> Self {
        Self {
            store,
            uploads,
            health: StoreHealthTracker::new(recheck_interval),
            probe_timeout,
            upload_timeout,
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn DurableStore>> {
        self.store.as_ref()
    }

    pub fn health(&self) -> StoreHealth {
        self.health.current()
    }

    /// Publish `path` as `object_name`.
    ///
    /// Never fails: any store problem leaves the file in the upload
    /// directory and yields a fallback outcome. On a durable outcome the
    /// local file has been removed.
    pub async fn publish(&self, object_name: &str, path: &Path, content_type: &str) -> PublishOutcome {
        let Some(store) = self.store.as_ref() else {
            return self.fallback(object_name);
        };

        match self.health.decide() {
            PublishDecision::Fallback => {
                tracing::debug!(object_name = %object_name, "Object store known unavailable, skipping upload");
                return self.fallback(object_name);
            }
            PublishDecision::Probe => {
                if let Err(e) = self.probe(store.as_ref()).await {
                    tracing::warn!(error = %e, object_name = %object_name, "Object store probe failed");
                    self.health.record(HealthEvent::ProbeFailed);
                    return self.fallback(object_name);
                }
                self.health.record(HealthEvent::ProbeSucceeded);
            }
            PublishDecision::Upload => {}
        }

        let start = std::time::Instant::now();
        let uploaded = match timeout(self.upload_timeout, store.put_file(object_name, path, content_type)).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Unreachable(format!(
                "upload timed out after {}s",
                self.upload_timeout.as_secs()
            ))),
        };

        let url = match uploaded {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    object_name = %object_name,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object upload failed, using local storage"
                );
                self.health.record(HealthEvent::UploadFailed);
                return self.fallback(object_name);
            }
        };
        self.health.record(HealthEvent::UploadSucceeded);

        if let Err(e) = tokio::fs::remove_file(path).await {
            // keep exactly one canonical copy
            tracing::error!(error = %e, path = %path.display(), "Failed to remove local file after upload");
            return match store.delete(object_name).await {
                Ok(()) => self.fallback(object_name),
                Err(delete_err) => {
                    tracing::error!(
                        error = %delete_err,
                        object_name = %object_name,
                        "Failed to roll back uploaded object, both copies remain"
                    );
                    self.durable(store.as_ref(), url)
                }
            };
        }

        tracing::info!(
            object_name = %object_name,
            url = %url,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File published to object store"
        );
        self.durable(store.as_ref(), url)
    }

    async fn probe(&self, store: &dyn DurableStore) -> Result<(), StorageError> {
        match timeout(self.probe_timeout, store.ensure_bucket()).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Unreachable(format!(
                "probe timed out after {}s",
                self.probe_timeout.as_secs()
            ))),
        }
    }

    fn durable(&self, store: &dyn DurableStore, url: String) -> PublishOutcome {
        PublishOutcome {
            mode: StorageMode::Durable,
            url,
            base_url: store.base_url(),
        }
    }

    fn fallback(&self, object_name: &str) -> PublishOutcome {
        PublishOutcome {
            mode: StorageMode::Fallback,
            url: self.uploads.generate_url(object_name),
            base_url: self.uploads.base_url().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::{tempdir, TempDir};
    use tutora_storage::{MemoryStore, StorageBackend, StorageResult};

    const LOCAL_BASE: &str = "http://localhost:5000/uploads";

    async fn uploads(dir: &TempDir) -> LocalStorage {
        LocalStorage::new(dir.path(), LOCAL_BASE.to_string()).await.unwrap()
    }

    fn publisher(store: Option<Arc<dyn DurableStore>>, uploads: LocalStorage) -> Publisher {
        Publisher::new(
            store,
            uploads,
            Duration::from_secs(10),
            Duration::from_secs(300),
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn test_durable_publish_removes_local_file() {
        let dir = tempdir().unwrap();
        let uploads = uploads(&dir).await;
        uploads.write("lesson.mp4", b"video").await.unwrap();
        let store = Arc::new(MemoryStore::new("http://localhost:9000/videos"));
        let publisher = publisher(Some(store.clone()), uploads.clone());

        let path = uploads.key_to_path("lesson.mp4").unwrap();
        let outcome = publisher.publish("lesson.mp4", &path, "video/mp4").await;

        assert_eq!(outcome.mode, StorageMode::Durable);
        assert_eq!(outcome.url, "http://localhost:9000/videos/lesson.mp4");
        assert_eq!(outcome.base_url, "http://localhost:9000/videos");
        assert!(store.get("lesson.mp4").await.is_some());
        assert!(!uploads.exists("lesson.mp4").await.unwrap());
        assert_eq!(publisher.health(), StoreHealth::Available);
    }

    #[tokio::test]
    async fn test_unreachable_store_falls_back_and_keeps_file() {
        let dir = tempdir().unwrap();
        let uploads = uploads(&dir).await;
        uploads.write("lesson.mp4", b"video").await.unwrap();
        let store = Arc::new(MemoryStore::new("http://localhost:9000/videos"));
        store.set_available(false);
        let publisher = publisher(Some(store.clone()), uploads.clone());

        let path = uploads.key_to_path("lesson.mp4").unwrap();
        let outcome = publisher.publish("lesson.mp4", &path, "video/mp4").await;

        assert_eq!(outcome.mode, StorageMode::Fallback);
        assert_eq!(outcome.url, "http://localhost:5000/uploads/lesson.mp4");
        assert!(uploads.exists("lesson.mp4").await.unwrap());
        assert!(store.is_empty().await);
        assert_eq!(publisher.health(), StoreHealth::Unavailable);
    }

    #[tokio::test]
    async fn test_known_down_store_is_not_probed_again() {
        let dir = tempdir().unwrap();
        let uploads = uploads(&dir).await;
        let store = Arc::new(MemoryStore::new("http://localhost:9000/videos"));
        store.set_available(false);
        let publisher = publisher(Some(store.clone()), uploads.clone());

        for name in ["a.mp4", "b.mp4", "c.mp4"] {
            uploads.write(name, b"x").await.unwrap();
            let path = uploads.key_to_path(name).unwrap();
            let outcome = publisher.publish(name, &path, "video/mp4").await;
            assert_eq!(outcome.mode, StorageMode::Fallback);
        }

        assert_eq!(store.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_no_store_always_falls_back() {
        let dir = tempdir().unwrap();
        let uploads = uploads(&dir).await;
        uploads.write("a.mp4", b"x").await.unwrap();
        let publisher = publisher(None, uploads.clone());

        let path = uploads.key_to_path("a.mp4").unwrap();
        let outcome = publisher.publish("a.mp4", &path, "video/mp4").await;

        assert_eq!(outcome.mode, StorageMode::Fallback);
        assert_eq!(outcome.base_url, LOCAL_BASE);
        assert_eq!(publisher.health(), StoreHealth::Unknown);
    }

    struct HangingStore;

    #[async_trait]
    impl DurableStore for HangingStore {
        async fn ensure_bucket(&self) -> StorageResult<()> {
            std::future::pending().await
        }

        async fn put_file(&self, _: &str, _: &Path, _: &str) -> StorageResult<String> {
            std::future::pending().await
        }

        async fn exists(&self, _: &str) -> StorageResult<bool> {
            Ok(false)
        }

        async fn delete(&self, _: &str) -> StorageResult<()> {
            Ok(())
        }

        fn base_url(&self) -> String {
            "http://unreachable:9000/videos".to_string()
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::S3
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_is_treated_as_unavailable() {
        let dir = tempdir().unwrap();
        let uploads = uploads(&dir).await;
        uploads.write("a.mp4", b"x").await.unwrap();
        let publisher = publisher(Some(Arc::new(HangingStore)), uploads.clone());

        let path = uploads.key_to_path("a.mp4").unwrap();
        let outcome = publisher.publish("a.mp4", &path, "video/mp4").await;

        assert_eq!(outcome.mode, StorageMode::Fallback);
        assert!(uploads.exists("a.mp4").await.unwrap());
        assert_eq!(publisher.health(), StoreHealth::Unavailable);
    }
}
