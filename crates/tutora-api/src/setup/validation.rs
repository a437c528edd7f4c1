//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use tutora_core::{Config, StorageBackend};

/// Validate critical configuration values
///
/// Hard errors come from `Config::validate`; the checks here only warn about
/// settings that work but are probably not what production wants.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.storage_backend() != StorageBackend::S3 {
        tracing::warn!(
            backend = %config.storage_backend(),
            "Production without the s3 backend - uploads are only kept on local disk"
        );
    }

    if is_production && config.public_base_url().contains("localhost") {
        tracing::warn!(
            public_base_url = %config.public_base_url(),
            "PUBLIC_BASE_URL points at localhost - fallback video URLs will not be reachable by clients"
        );
    }

    if !config.clean_uploads_on_start() {
        tracing::warn!("CLEAN_UPLOADS_ON_START is disabled - stale chunks from earlier runs are kept");
    }

    Ok(())
}
