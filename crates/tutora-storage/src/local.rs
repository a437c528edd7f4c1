use crate::keys::{parse_part_index, validate_key};
use crate::traits::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem staging area
///
/// One instance wraps one directory: the chunk directory holding
/// `{key}.part_{n}` files, or the upload directory holding reassembled files
/// that are served statically under `base_url`.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Directory for staged files (e.g., "uploads-chunks")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:5000/uploads")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let storage = LocalStorage {
            base_path: base_path.into(),
            base_url,
        };
        storage.ensure_dir().await?;
        Ok(storage)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create the directory (and parents) if it does not exist.
    pub async fn ensure_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                self.base_path.display(),
                e
            ))
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Keys are flat names, so a valid key always resolves directly inside
    /// the base directory.
    pub fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    /// Generate public URL for file
    pub fn generate_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(key)
        )
    }

    /// Write `data` under `key`, replacing any existing file. Returns the number of bytes written.
    pub async fn write(&self, key: &str, data: &[u8]) -> StorageResult<u64> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local staging write successful"
        );

        Ok(data.len() as u64)
    }

    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    pub async fn size(&self, key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    /// Delete a file. A file that is already gone counts as deleted.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), key = %key, "Local staging delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Indices of every `{upload_key}.part_{n}` file currently staged, ascending.
    pub async fn list_parts(&self, upload_key: &str) -> StorageResult<Vec<u32>> {
        validate_key(upload_key)?;
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut indices = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(index) = name.to_str().and_then(|n| parse_part_index(upload_key, n)) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// Remove every entry under the directory, recursing into subdirectories.
    ///
    /// Entries that cannot be removed are logged and skipped. Returns the
    /// number of entries removed.
    pub async fn clear(&self) -> StorageResult<usize> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::IoError(e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let result = match entry.file_type().await {
                Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path).await,
                Ok(_) => fs::remove_file(&path).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to remove staged entry");
                }
            }
        }
        Ok(removed)
    }

    /// Check that the directory accepts writes by creating and removing a probe file.
    pub async fn check_writable(&self) -> StorageResult<()> {
        let probe = self
            .base_path
            .join(format!(".write-check-{}", uuid::Uuid::new_v4()));
        fs::write(&probe, b"ok").await?;
        fs::remove_file(&probe).await?;
        Ok(())
    }
}
