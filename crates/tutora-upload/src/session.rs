//! Upload sessions.
//!
//! A session pins the object name and chunk count of one upload up front,
//! so chunks can be checked for strict in-order delivery and uploads that
//! share an original file name never share a key.

use crate::error::{UploadError, UploadResult};
use crate::receiver::{is_allowed_mime_type, normalize_mime_type, normalize_upload_name};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tutora_core::models::UploadProgressResponse;
use tutora_storage::keys::session_object_name;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: Uuid,
    pub object_name: String,
    pub original_name: String,
    pub total_chunks: u32,
    pub mimetype: Option<String>,
    /// Chunks stored so far; also the next expected index.
    pub received_chunks: u32,
    pub created_at: DateTime<Utc>,
    in_flight: bool,
    last_activity: Instant,
}

impl UploadSession {
    pub fn progress(&self) -> UploadProgressResponse {
        UploadProgressResponse {
            upload_id: self.id,
            object_name: self.object_name.clone(),
            original_name: self.original_name.clone(),
            received_chunks: self.received_chunks,
            total_chunks: self.total_chunks,
            created_at: self.created_at,
        }
    }
}

/// In-memory registry of open upload sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, UploadSession>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(
        &self,
        original_name: &str,
        total_chunks: u32,
        mimetype: Option<String>,
    ) -> UploadResult<UploadSession> {
        if total_chunks == 0 {
            return Err(UploadError::InvalidInput(
                "totalChunks must be at least 1".to_string(),
            ));
        }
        let normalized = normalize_upload_name(original_name)?;
        let mimetype = match mimetype.filter(|m| !m.trim().is_empty()) {
            Some(m) => {
                let m = normalize_mime_type(&m);
                if !is_allowed_mime_type(&m) {
                    return Err(UploadError::UnsupportedMediaType(m));
                }
                Some(m)
            }
            None => None,
        };

        let id = Uuid::new_v4();
        let session = UploadSession {
            id,
            object_name: session_object_name(id, &normalized),
            original_name: original_name.to_string(),
            total_chunks,
            mimetype,
            received_chunks: 0,
            created_at: Utc::now(),
            in_flight: false,
            last_activity: Instant::now(),
        };

        self.sessions.write().await.insert(id, session.clone());

        tracing::info!(
            upload_id = %id,
            object_name = %session.object_name,
            total_chunks,
            "Upload session created"
        );
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> UploadResult<UploadSession> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(UploadError::SessionNotFound(id))
    }

    /// Reserve chunk `index` of session `id` for writing.
    ///
    /// The index must be the next expected one and no other chunk of the
    /// session may be in progress. Every successful claim must be followed
    /// by [`SessionRegistry::release_chunk`].
    pub async fn claim_chunk(&self, id: Uuid, index: u32, total_chunks: u32) -> UploadResult<UploadSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(UploadError::SessionNotFound(id))?;

        if total_chunks != session.total_chunks {
            return Err(UploadError::SessionConflict(format!(
                "totalChunks {} does not match session ({})",
                total_chunks, session.total_chunks
            )));
        }
        if session.in_flight {
            return Err(UploadError::SessionConflict(format!(
                "Another chunk of upload {} is still being processed",
                id
            )));
        }
        if index != session.received_chunks {
            return Err(UploadError::SessionConflict(format!(
                "Expected chunk {}, got {}",
                session.received_chunks, index
            )));
        }

        session.in_flight = true;
        session.last_activity = Instant::now();
        Ok(session.clone())
    }

    /// Release a claimed chunk, counting it as received when `stored`.
    pub async fn release_chunk(&self, id: Uuid, stored: bool) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.in_flight = false;
            session.last_activity = Instant::now();
            if stored {
                session.received_chunks += 1;
            }
        }
    }

    pub async fn remove(&self, id: Uuid) -> Option<UploadSession> {
        self.sessions.write().await.remove(&id)
    }

    /// Remove and return sessions idle for longer than the TTL.
    pub async fn evict_expired(&self) -> Vec<UploadSession> {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<Uuid> = sessions
            .values()
            .filter(|s| !s.in_flight && s.last_activity.elapsed() >= self.ttl)
            .map(|s| s.id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| sessions.remove(&id))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_create_assigns_unique_object_names() {
        let registry = registry();
        let a = registry.create("my clip.mp4", 3, None).await.unwrap();
        let b = registry.create("my clip.mp4", 3, None).await.unwrap();

        assert_ne!(a.object_name, b.object_name);
        assert_eq!(a.object_name, format!("{}-myclip.mp4", a.id));
        assert_eq!(a.original_name, "my clip.mp4");
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let registry = registry();
        assert!(matches!(
            registry.create("a.mp4", 0, None).await,
            Err(UploadError::InvalidInput(_))
        ));
        assert!(matches!(
            registry.create("a/b.mp4", 1, None).await,
            Err(UploadError::InvalidInput(_))
        ));
        assert!(matches!(
            registry.create("a.png", 1, Some("image/png".to_string())).await,
            Err(UploadError::UnsupportedMediaType(_))
        ));
    }

    #[tokio::test]
    async fn test_chunks_must_arrive_in_order() {
        let registry = registry();
        let session = registry.create("a.mp4", 3, None).await.unwrap();

        assert!(matches!(
            registry.claim_chunk(session.id, 1, 3).await,
            Err(UploadError::SessionConflict(_))
        ));

        registry.claim_chunk(session.id, 0, 3).await.unwrap();
        registry.release_chunk(session.id, true).await;
        registry.claim_chunk(session.id, 1, 3).await.unwrap();
        registry.release_chunk(session.id, true).await;

        assert_eq!(registry.get(session.id).await.unwrap().received_chunks, 2);
    }

    #[tokio::test]
    async fn test_failed_chunk_can_be_resent() {
        let registry = registry();
        let session = registry.create("a.mp4", 2, None).await.unwrap();

        registry.claim_chunk(session.id, 0, 2).await.unwrap();
        registry.release_chunk(session.id, false).await;

        assert!(registry.claim_chunk(session.id, 0, 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_claim_is_rejected() {
        let registry = registry();
        let session = registry.create("a.mp4", 2, None).await.unwrap();

        registry.claim_chunk(session.id, 0, 2).await.unwrap();
        assert!(matches!(
            registry.claim_chunk(session.id, 0, 2).await,
            Err(UploadError::SessionConflict(_))
        ));
    }

    #[tokio::test]
    async fn test_total_mismatch_and_unknown_session() {
        let registry = registry();
        let session = registry.create("a.mp4", 2, None).await.unwrap();

        assert!(matches!(
            registry.claim_chunk(session.id, 0, 5).await,
            Err(UploadError::SessionConflict(_))
        ));
        assert!(matches!(
            registry.claim_chunk(Uuid::new_v4(), 0, 2).await,
            Err(UploadError::SessionNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_expire() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let idle = registry.create("idle.mp4", 2, None).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        let active = registry.create("active.mp4", 2, None).await.unwrap();
        assert!(registry.evict_expired().await.is_empty());

        tokio::time::advance(Duration::from_secs(31)).await;
        let evicted = registry.evict_expired().await;

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, idle.id);
        assert!(registry.get(active.id).await.is_ok());
    }
}
