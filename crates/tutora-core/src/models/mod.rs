pub mod upload;

pub use upload::{
    ChunkReceivedResponse, FileDescriptor, StartUploadRequest, StartUploadResponse,
    StorageMode, UploadCompleteResponse, UploadProgressResponse, CHUNK_RECEIVED_MESSAGE,
    DURABLE_UPLOAD_MESSAGE, FALLBACK_UPLOAD_MESSAGE,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_mode_messages_are_reexported() {
        assert_eq!(StorageMode::Durable.message(), DURABLE_UPLOAD_MESSAGE);
        assert_eq!(StorageMode::Fallback.message(), FALLBACK_UPLOAD_MESSAGE);
        assert_eq!(CHUNK_RECEIVED_MESSAGE, "Chunk uploaded successfully");
    }
}
