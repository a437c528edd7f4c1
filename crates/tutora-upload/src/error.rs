use std::io;
use tutora_storage::StorageError;
use uuid::Uuid;

/// Errors raised while receiving, reassembling, or tracking a chunked upload.
///
/// Object-store failures never appear here: the publisher degrades them to
/// a fallback outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("No {0} field in request")]
    MissingField(&'static str),

    #[error("Unsupported media type: {0}. Only video files are allowed")]
    UnsupportedMediaType(String),

    #[error("Upload session {0} not found")]
    SessionNotFound(Uuid),

    #[error("{0}")]
    SessionConflict(String),

    #[error("Missing chunk {index} of {total} for {upload_key}")]
    MissingChunk {
        upload_key: String,
        index: u32,
        total: u32,
    },

    #[error("Chunk {index} of {upload_key} still busy after {attempts} attempts")]
    ChunkBusy {
        upload_key: String,
        index: u32,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    ChunkProcessing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;
