//! API constants
//!
//! Route prefixes and multipart field names shared by the router, the
//! handlers and the OpenAPI document.

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// Current API version
pub const API_VERSION: &str = "v0";

/// Versioned prefix for all upload routes
pub const API_PREFIX: &str = "/api/v0";

/// Multipart field carrying the chunk bytes
pub const VIDEO_FIELD: &str = "video";
pub const CHUNK_FIELD: &str = "chunk";
pub const TOTAL_CHUNKS_FIELD: &str = "totalChunks";
pub const ORIGINAL_NAME_FIELD: &str = "originalname";
pub const UPLOAD_ID_FIELD: &str = "uploadId";
