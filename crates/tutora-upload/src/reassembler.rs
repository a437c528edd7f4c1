use crate::error::{UploadError, UploadResult};
use crate::retry::{is_transient, retry_on_busy, RetryPolicy};
use async_trait::async_trait;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tutora_storage::keys::part_file_name;
use tutora_storage::LocalStorage;

/// Reader over one staged part.
pub type PartReader = Box<dyn AsyncRead + Send + Unpin>;

/// File operations the reassembler performs on staged parts.
#[async_trait]
pub trait PartFiles: Send + Sync {
    async fn open(&self, path: &Path) -> io::Result<PartReader>;

    /// Remove a part. A part that is already gone is not an error.
    async fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Parts on the local filesystem.
pub struct DiskPartFiles;

#[async_trait]
impl PartFiles for DiskPartFiles {
    async fn open(&self, path: &Path) -> io::Result<PartReader> {
        Ok(Box::new(File::open(path).await?))
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// The concatenated upload in the served upload directory.
#[derive(Debug, Clone)]
pub struct ReassembledFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Concatenates staged chunks into one file.
#[derive(Clone)]
pub struct Reassembler {
    chunks: LocalStorage,
    uploads: LocalStorage,
    retry: RetryPolicy,
    parts: Arc<dyn PartFiles>,
}

impl Reassembler {
    pub fn new(chunks: LocalStorage, uploads: LocalStorage, retry: RetryPolicy) -> Self {
        Self {
            chunks,
            uploads,
            retry,
            parts: Arc::new(DiskPartFiles),
        }
    }

    /// Replace how staged parts are opened and removed.
    pub fn with_part_files(mut self, parts: Arc<dyn PartFiles>) -> Self {
        self.parts = parts;
        self
    }

    /// Fail with `InvalidInput` when `uploads/<upload_key>` is an existing directory.
    pub async fn ensure_output_slot(&self, upload_key: &str) -> UploadResult<()> {
        let output_path = self.uploads.key_to_path(upload_key)?;
        match tokio::fs::metadata(&output_path).await {
            Ok(meta) if meta.is_dir() => Err(UploadError::InvalidInput(format!(
                "Upload name '{}' is taken by a directory",
                upload_key
            ))),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Concatenate parts `0..total_chunks` of `upload_key` into `uploads/<upload_key>`.
    ///
    /// Every part and the output slot are checked before the output is
    /// opened, so a missing part never leaves an output file behind. Each part is deleted right after
    /// it is copied. On failure the partial output and all remaining parts
    /// are removed.
    pub async fn reassemble(&self, upload_key: &str, total_chunks: u32) -> UploadResult<ReassembledFile> {
        let start = std::time::Instant::now();

        for index in 0..total_chunks {
            if !self.chunks.exists(&part_file_name(upload_key, index)).await? {
                tracing::error!(
                    upload_key = %upload_key,
                    chunk_index = index,
                    total_chunks,
                    "Chunk missing at reassembly"
                );
                self.discard_parts(upload_key, total_chunks).await;
                return Err(UploadError::MissingChunk {
                    upload_key: upload_key.to_string(),
                    index,
                    total: total_chunks,
                });
            }
        }

        if let Err(e) = self.ensure_output_slot(upload_key).await {
            self.discard_parts(upload_key, total_chunks).await;
            return Err(e);
        }

        let output_path = self.uploads.key_to_path(upload_key)?;
        let output = Mutex::new(File::create(&output_path).await?);

        let result = match self.copy_parts(&output, upload_key, total_chunks).await {
            Ok(size) => output.lock().await.sync_all().await.map(|_| size).map_err(UploadError::from),
            Err(e) => Err(e),
        };
        drop(output);

        match result {
            Ok(size) => {
                tracing::info!(
                    upload_key = %upload_key,
                    total_chunks,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Chunks reassembled"
                );
                Ok(ReassembledFile {
                    path: output_path,
                    size,
                })
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    upload_key = %upload_key,
                    total_chunks,
                    "Reassembly failed, removing partial output"
                );
                if let Err(remove_err) = tokio::fs::remove_file(&output_path).await {
                    if remove_err.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(
                            error = %remove_err,
                            path = %output_path.display(),
                            "Failed to remove partial output"
                        );
                    }
                }
                self.discard_parts(upload_key, total_chunks).await;
                Err(e)
            }
        }
    }

    async fn copy_parts(&self, output: &Mutex<File>, upload_key: &str, total_chunks: u32) -> UploadResult<u64> {
        let mut written = 0u64;

        for index in 0..total_chunks {
            let part_path = self.chunks.key_to_path(&part_file_name(upload_key, index))?;
            let offset = written;

            let copied = {
                let part_path = part_path.as_path();
                retry_on_busy(self.retry, move |attempt| async move {
                    let mut out = output.lock().await;
                    if attempt > 1 {
                        // drop bytes from the failed attempt
                        out.set_len(offset).await?;
                        out.seek(SeekFrom::Start(offset)).await?;
                    }
                    let part = self.parts.open(part_path).await?;
                    append_part(&mut out, part).await
                })
                .await
                .map_err(|(e, attempts)| busy_or_io(upload_key, index, attempts, e))?
            };
            written += copied;

            {
                let part_path = part_path.as_path();
                retry_on_busy(self.retry, move |_| self.parts.remove(part_path))
                .await
                .map_err(|(e, attempts)| busy_or_io(upload_key, index, attempts, e))?;
            }

            tracing::debug!(
                upload_key = %upload_key,
                chunk_index = index,
                size_bytes = copied,
                "Chunk appended"
            );
        }

        Ok(written)
    }

    /// Best-effort removal of every part of an upload. Errors are only logged.
    pub async fn discard_parts(&self, upload_key: &str, total_chunks: u32) {
        let mut indices = match self.chunks.list_parts(upload_key).await {
            Ok(indices) => indices,
            Err(e) => {
                tracing::warn!(error = %e, upload_key = %upload_key, "Failed to list parts for cleanup");
                (0..total_chunks).collect()
            }
        };
        indices.dedup();

        for index in indices {
            if let Err(e) = self.chunks.delete(&part_file_name(upload_key, index)).await {
                tracing::warn!(
                    error = %e,
                    upload_key = %upload_key,
                    chunk_index = index,
                    "Failed to remove leftover chunk"
                );
            }
        }
    }
}

async fn append_part(out: &mut File, mut part: PartReader) -> io::Result<u64> {
    let copied = tokio::io::copy(&mut part, out).await?;
    out.flush().await?;
    Ok(copied)
}

fn busy_or_io(upload_key: &str, index: u32, attempts: u32, err: io::Error) -> UploadError {
    if is_transient(&err) {
        UploadError::ChunkBusy {
            upload_key: upload_key.to_string(),
            index,
            attempts,
            source: err,
        }
    } else {
        UploadError::Io(err)
    }
}
