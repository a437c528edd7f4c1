use crate::error::{UploadError, UploadResult};
use crate::publisher::Publisher;
use crate::reassembler::Reassembler;
use crate::receiver::{ChunkReceiver, ChunkRequest};
use crate::retry::RetryPolicy;
use crate::session::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tutora_core::models::{
    ChunkReceivedResponse, FileDescriptor, StartUploadRequest, StartUploadResponse,
    UploadCompleteResponse, UploadProgressResponse, CHUNK_RECEIVED_MESSAGE,
};
use tutora_core::Config;
use tutora_storage::{DurableStore, LocalStorage};
use uuid::Uuid;

/// Result of one chunk request.
#[derive(Debug, Clone)]
pub enum ChunkOutcome {
    /// A non-final chunk was stored.
    Received(ChunkReceivedResponse),
    /// The final chunk was stored, reassembled and published.
    Completed(UploadCompleteResponse),
}

/// Receiver, reassembler and publisher wired together, plus upload sessions.
pub struct UploadPipeline {
    uploads: LocalStorage,
    chunks: LocalStorage,
    receiver: ChunkReceiver,
    reassembler: Reassembler,
    publisher: Publisher,
    sessions: SessionRegistry,
}

impl UploadPipeline {
    pub fn new(
        uploads: LocalStorage,
        chunks: LocalStorage,
        publisher: Publisher,
        retry: RetryPolicy,
        session_ttl: Duration,
    ) -> Self {
        Self {
            receiver: ChunkReceiver::new(chunks.clone()),
            reassembler: Reassembler::new(chunks.clone(), uploads.clone(), retry),
            uploads,
            chunks,
            publisher,
            sessions: SessionRegistry::new(session_ttl),
        }
    }

    /// Build the pipeline from configuration. Creates the staging directories.
    pub async fn from_config(config: &Config, store: Option<Arc<dyn DurableStore>>) -> UploadResult<Self> {
        let uploads = LocalStorage::new(config.upload_dir().clone(), config.local_files_base_url()).await?;
        let chunks = LocalStorage::new(config.chunk_dir().clone(), config.local_files_base_url()).await?;

        let publisher = Publisher::new(
            store,
            uploads.clone(),
            config.store_probe_timeout(),
            config.store_upload_timeout(),
            config.store_recheck_interval(),
        );

        Ok(Self::new(
            uploads,
            chunks,
            publisher,
            RetryPolicy::new(config.chunk_retry_attempts(), config.chunk_retry_delay()),
            config.upload_session_ttl(),
        ))
    }

    pub fn uploads(&self) -> &LocalStorage {
        &self.uploads
    }

    pub fn chunks(&self) -> &LocalStorage {
        &self.chunks
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Store one chunk; on the final chunk, reassemble and publish.
    pub async fn handle_chunk(&self, request: ChunkRequest) -> UploadResult<ChunkOutcome> {
        match request.upload_id {
            Some(upload_id) => self.handle_session_chunk(upload_id, request).await,
            None => self.handle_legacy_chunk(request).await,
        }
    }

    async fn handle_legacy_chunk(&self, request: ChunkRequest) -> UploadResult<ChunkOutcome> {
        let upload_key = request.normalized_name.as_str();

        if request.index == 0 {
            self.reassembler.ensure_output_slot(upload_key).await?;
            self.receiver.clear_stale_parts(upload_key).await?;
        }
        self.receiver
            .store(upload_key, request.index, &request.data)
            .await?;

        if !request.is_final() {
            return Ok(received(&request));
        }

        self.complete(
            upload_key,
            &request.original_name,
            &request.mimetype,
            request.total_chunks,
        )
        .await
    }

    async fn handle_session_chunk(&self, upload_id: Uuid, request: ChunkRequest) -> UploadResult<ChunkOutcome> {
        let session = self
            .sessions
            .claim_chunk(upload_id, request.index, request.total_chunks)
            .await?;

        let stored = self
            .receiver
            .store(&session.object_name, request.index, &request.data)
            .await;
        if stored.is_ok() && request.is_final() {
            self.sessions.remove(upload_id).await;
        } else {
            self.sessions.release_chunk(upload_id, stored.is_ok()).await;
        }
        stored?;

        if !request.is_final() {
            return Ok(received(&request));
        }

        let mimetype = session.mimetype.as_deref().unwrap_or(&request.mimetype);
        self.complete(
            &session.object_name,
            &session.original_name,
            mimetype,
            session.total_chunks,
        )
        .await
    }

    async fn complete(
        &self,
        upload_key: &str,
        original_name: &str,
        mimetype: &str,
        total_chunks: u32,
    ) -> UploadResult<ChunkOutcome> {
        let file = self
            .reassembler
            .reassemble(upload_key, total_chunks)
            .await
            .map_err(|e| match e {
                UploadError::InvalidInput(_) => e,
                other => UploadError::ChunkProcessing(other.to_string()),
            })?;

        let outcome = self.publisher.publish(upload_key, &file.path, mimetype).await;

        tracing::info!(
            upload_key = %upload_key,
            total_chunks,
            size_bytes = file.size,
            storage = ?outcome.mode,
            video_url = %outcome.url,
            "Upload complete"
        );

        Ok(ChunkOutcome::Completed(UploadCompleteResponse {
            message: outcome.mode.message().to_string(),
            storage: outcome.mode,
            file: FileDescriptor {
                filename: upload_key.to_string(),
                original_name: original_name.to_string(),
                size: file.size,
                mimetype: mimetype.to_string(),
                base_url: outcome.base_url,
                video_url: outcome.url,
            },
        }))
    }

    pub async fn start_session(&self, request: StartUploadRequest) -> UploadResult<StartUploadResponse> {
        let session = self
            .sessions
            .create(&request.originalname, request.total_chunks, request.mimetype)
            .await?;
        Ok(StartUploadResponse {
            upload_id: session.id,
            object_name: session.object_name,
            total_chunks: session.total_chunks,
        })
    }

    pub async fn session_progress(&self, upload_id: Uuid) -> UploadResult<UploadProgressResponse> {
        Ok(self.sessions.get(upload_id).await?.progress())
    }

    /// Drop a session and its staged chunks.
    pub async fn abort_session(&self, upload_id: Uuid) -> UploadResult<()> {
        let session = self
            .sessions
            .remove(upload_id)
            .await
            .ok_or(UploadError::SessionNotFound(upload_id))?;
        self.reassembler
            .discard_parts(&session.object_name, session.total_chunks)
            .await;
        tracing::info!(upload_id = %upload_id, object_name = %session.object_name, "Upload session aborted");
        Ok(())
    }

    /// Evict idle sessions and remove their staged chunks.
    pub async fn sweep_expired_sessions(&self) -> usize {
        let expired = self.sessions.evict_expired().await;
        for session in &expired {
            tracing::info!(
                upload_id = %session.id,
                object_name = %session.object_name,
                received_chunks = session.received_chunks,
                total_chunks = session.total_chunks,
                "Upload session expired"
            );
            self.reassembler
                .discard_parts(&session.object_name, session.total_chunks)
                .await;
        }
        expired.len()
    }

    /// Start the background sweeper for idle sessions.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start_session_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = tokio::time::interval(every);
            sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                sweep_interval.tick().await;
                let evicted = self.sweep_expired_sessions().await;
                if evicted > 0 {
                    tracing::info!(evicted, "Expired upload sessions removed");
                }
            }
        })
    }
}

fn received(request: &ChunkRequest) -> ChunkOutcome {
    ChunkOutcome::Received(ChunkReceivedResponse {
        message: CHUNK_RECEIVED_MESSAGE.to_string(),
        chunk: request.index + 1,
        total_chunks: request.total_chunks,
    })
}
