pub mod upload_sessions;
pub mod video_upload;
