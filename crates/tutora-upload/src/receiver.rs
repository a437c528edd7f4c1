use crate::error::{UploadError, UploadResult};
use bytes::Bytes;
use tutora_storage::keys::{normalize_name, part_file_name, validate_key};
use tutora_storage::LocalStorage;
use uuid::Uuid;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Raw multipart fields of one chunk request, before validation.
#[derive(Debug, Default, Clone)]
pub struct ChunkFields {
    pub data: Option<Bytes>,
    pub content_type: Option<String>,
    pub chunk: Option<String>,
    pub total_chunks: Option<String>,
    pub original_name: Option<String>,
    pub upload_id: Option<String>,
}

/// A validated chunk request.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub data: Bytes,
    pub mimetype: String,
    pub index: u32,
    pub total_chunks: u32,
    pub original_name: String,
    pub normalized_name: String,
    pub upload_id: Option<Uuid>,
}

impl ChunkRequest {
    pub fn is_final(&self) -> bool {
        self.index + 1 == self.total_chunks
    }

    /// Validate raw fields. The binary field and its media type are checked
    /// first so that a rejected request never reaches the disk.
    pub fn from_fields(fields: ChunkFields) -> UploadResult<Self> {
        let data = fields.data.ok_or(UploadError::MissingField("video"))?;

        let mimetype = normalize_mime_type(fields.content_type.as_deref().unwrap_or(OCTET_STREAM));
        if !is_allowed_mime_type(&mimetype) {
            return Err(UploadError::UnsupportedMediaType(mimetype));
        }

        let index = parse_count(fields.chunk, "chunk")?;
        let total_chunks = parse_count(fields.total_chunks, "totalChunks")?;
        if total_chunks == 0 {
            return Err(UploadError::InvalidInput(
                "totalChunks must be at least 1".to_string(),
            ));
        }
        if index >= total_chunks {
            return Err(UploadError::InvalidInput(format!(
                "chunk {} is out of range for totalChunks {}",
                index, total_chunks
            )));
        }

        let original_name = fields
            .original_name
            .ok_or(UploadError::MissingField("originalname"))?;
        let normalized_name = normalize_upload_name(&original_name)?;

        let upload_id = fields
            .upload_id
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                Uuid::parse_str(s.trim())
                    .map_err(|_| UploadError::InvalidInput(format!("Invalid uploadId: {}", s)))
            })
            .transpose()?;

        Ok(Self {
            data,
            mimetype,
            index,
            total_chunks,
            original_name,
            normalized_name,
            upload_id,
        })
    }
}

fn parse_count(value: Option<String>, field: &'static str) -> UploadResult<u32> {
    let value = value.ok_or(UploadError::MissingField(field))?;
    value
        .trim()
        .parse()
        .map_err(|_| UploadError::InvalidInput(format!("{} must be a non-negative integer", field)))
}

/// Strip whitespace from a client file name and check it is usable as a key.
pub fn normalize_upload_name(original_name: &str) -> UploadResult<String> {
    let normalized = normalize_name(original_name);
    validate_key(&normalized)
        .map_err(|_| UploadError::InvalidInput(format!("Invalid originalname: {}", original_name)))?;
    Ok(normalized)
}

/// Lowercased media type without parameters (`video/mp4; codecs=x` -> `video/mp4`).
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// `video/*` or the generic octet-stream type.
pub fn is_allowed_mime_type(mimetype: &str) -> bool {
    match mimetype.split_once('/') {
        Some(("video", subtype)) => !subtype.is_empty(),
        _ => mimetype == OCTET_STREAM,
    }
}

/// Persists chunk bytes to the chunk staging directory.
#[derive(Clone)]
pub struct ChunkReceiver {
    chunks: LocalStorage,
}

impl ChunkReceiver {
    pub fn new(chunks: LocalStorage) -> Self {
        Self { chunks }
    }

    /// Write chunk `index` of `upload_key`, replacing a previous copy of the same chunk.
    pub async fn store(&self, upload_key: &str, index: u32, data: &[u8]) -> UploadResult<u64> {
        let name = part_file_name(upload_key, index);
        let size = self.chunks.write(&name, data).await?;
        tracing::debug!(
            upload_key = %upload_key,
            chunk_index = index,
            size_bytes = size,
            "Chunk stored"
        );
        Ok(size)
    }

    /// Remove parts left behind by another upload that used the same key.
    ///
    /// Called before chunk 0 of a session-less upload is written. Returns the
    /// number of stale parts removed.
    pub async fn clear_stale_parts(&self, upload_key: &str) -> UploadResult<usize> {
        let existing = self.chunks.list_parts(upload_key).await?;
        let Some(max_index) = existing.last().copied() else {
            return Ok(0);
        };

        tracing::warn!(
            upload_key = %upload_key,
            stale_parts = existing.len(),
            max_index,
            next_index = max_index + 1,
            "Found parts from a previous upload with the same name, discarding them"
        );

        for index in &existing {
            self.chunks.delete(&part_file_name(upload_key, *index)).await?;
        }
        Ok(existing.len())
    }
}
