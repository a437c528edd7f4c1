//! Shared key generation for the upload pipeline.
//!
//! Key format: chunk parts are `{upload_key}.part_{index}`; the reassembled
//! file and the published object are `{upload_key}`. Legacy uploads use the
//! normalized original name as the upload key, session uploads use
//! `{upload_id}-{normalized_name}`.

use crate::traits::{StorageError, StorageResult};
use uuid::Uuid;

const PART_SEPARATOR: &str = ".part_";

/// Remove every whitespace character from a client-supplied file name.
///
/// `"my video.mp4"` becomes `"myvideo.mp4"`.
pub fn normalize_name(original_name: &str) -> String {
    original_name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Upload key for a session-scoped upload.
pub fn session_object_name(upload_id: Uuid, normalized_name: &str) -> String {
    format!("{}-{}", upload_id, normalized_name)
}

/// File name of the chunk with the given index.
pub fn part_file_name(upload_key: &str, index: u32) -> String {
    format!("{}{}{}", upload_key, PART_SEPARATOR, index)
}

/// Parse the chunk index out of a part file name, if it belongs to `upload_key`.
///
/// Returns `None` for files of other uploads and for names whose suffix is
/// not a plain decimal index.
pub fn parse_part_index(upload_key: &str, file_name: &str) -> Option<u32> {
    let suffix = file_name
        .strip_prefix(upload_key)?
        .strip_prefix(PART_SEPARATOR)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Reject keys that are empty or could escape the staging directory.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.contains('/') || key.contains('\\') || key.contains('\0') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }
    Ok(())
}
