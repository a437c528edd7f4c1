//! Wire models of the chunked video upload endpoint.
//!
//! Field names are camelCase on the wire because the course-authoring client
//! persists `videoUrl` verbatim into a roadmap day.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const CHUNK_RECEIVED_MESSAGE: &str = "Chunk uploaded successfully";
pub const DURABLE_UPLOAD_MESSAGE: &str = "File uploaded successfully to cloud storage.";
pub const FALLBACK_UPLOAD_MESSAGE: &str =
    "File processed but cloud storage unavailable. Using local storage.";

/// Where the authoritative copy of a reassembled file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Object store; the local copy was deleted.
    Durable,
    /// Local staging directory, served over HTTP.
    Fallback,
}

impl StorageMode {
    pub fn message(&self) -> &'static str {
        match self {
            StorageMode::Durable => DURABLE_UPLOAD_MESSAGE,
            StorageMode::Fallback => FALLBACK_UPLOAD_MESSAGE,
        }
    }
}

/// Descriptor of a fully uploaded file, handed back to the calling UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Storage name (object name / local file name)
    pub filename: String,
    /// File name as supplied by the client, before normalization
    pub original_name: String,
    /// Size of the reassembled file in bytes
    pub size: u64,
    /// Declared mime type
    pub mimetype: String,
    /// Base URL of the location currently holding the file
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Fetchable URL of the authoritative copy
    pub video_url: String,
}

/// Acknowledgement of a non-final chunk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChunkReceivedResponse {
    pub message: String,
    /// 1-based number of the chunk just received
    pub chunk: u32,
    pub total_chunks: u32,
}

/// Response to the final chunk of an upload (durable or fallback).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteResponse {
    pub message: String,
    pub storage: StorageMode,
    pub file: FileDescriptor,
}

/// Request to open an upload session
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartUploadRequest {
    /// Original file name
    pub originalname: String,
    /// Number of chunks the client will send
    pub total_chunks: u32,
    /// Declared mime type of the whole file
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Response for opening an upload session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartUploadResponse {
    pub upload_id: Uuid,
    /// Object name the file will be published under
    pub object_name: String,
    pub total_chunks: u32,
}

/// Progress of an upload session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgressResponse {
    pub upload_id: Uuid,
    pub object_name: String,
    pub original_name: String,
    pub received_chunks: u32,
    pub total_chunks: u32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_descriptor_wire_shape() {
        let descriptor = FileDescriptor {
            filename: "lesson1.mp4".to_string(),
            original_name: "lesson 1.mp4".to_string(),
            size: 42,
            mimetype: "video/mp4".to_string(),
            base_url: "http://localhost:5000/uploads".to_string(),
            video_url: "http://localhost:5000/uploads/lesson1.mp4".to_string(),
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["originalName"], "lesson 1.mp4");
        assert_eq!(json["baseURL"], "http://localhost:5000/uploads");
        assert_eq!(json["videoUrl"], "http://localhost:5000/uploads/lesson1.mp4");
        assert_eq!(json["size"], 42);
    }

    #[test]
    fn test_chunk_ack_wire_shape() {
        let ack = ChunkReceivedResponse {
            message: CHUNK_RECEIVED_MESSAGE.to_string(),
            chunk: 1,
            total_chunks: 3,
        };
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["chunk"], 1);
        assert_eq!(json["totalChunks"], 3);
    }

    #[test]
    fn test_storage_mode_messages_are_distinguishable() {
        assert!(StorageMode::Durable.message().contains("cloud storage."));
        assert!(StorageMode::Fallback.message().contains("local storage"));
    }
}
