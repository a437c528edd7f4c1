//! Startup cleanup of the staging directories.

use crate::error::UploadResult;
use tutora_storage::LocalStorage;

/// Empty the staging directories and make sure they exist.
///
/// Leftovers from a previous run are scratch data: anything that cannot be
/// removed is logged and skipped. Failing to create a directory is returned
/// as an error, since nothing can be staged without it.
pub async fn prepare_staging(uploads: &LocalStorage, chunks: &LocalStorage, clean: bool) -> UploadResult<usize> {
    let mut removed = 0;

    if clean {
        for dir in [uploads, chunks] {
            match dir.clear().await {
                Ok(count) => removed += count,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %dir.base_path().display(),
                        "Failed to clean staging directory"
                    );
                }
            }
        }
        tracing::info!(removed, path = %uploads.base_path().display(), "Staging directories cleaned");
    }

    uploads.ensure_dir().await?;
    chunks.ensure_dir().await?;

    Ok(removed)
}
