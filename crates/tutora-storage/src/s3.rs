use crate::traits::{DurableStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use std::path::Path;
use tutora_core::config::StoreConfig;

/// S3-compatible object store (MinIO, AWS S3, ...)
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
    public_base_url: String,
    public_policy: bool,
}

impl S3Store {
    /// Build a client for the configured endpoint.
    ///
    /// Static credentials are used when both keys are configured; otherwise
    /// the default AWS credential chain applies. Path-style addressing is
    /// always on, which MinIO requires.
    pub async fn new(config: &StoreConfig) -> StorageResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "STORE_BUCKET must not be empty".to_string(),
            ));
        }

        let region = Region::new(config.region.clone());
        let retry_config = RetryConfig::standard().with_max_attempts(3);

        let mut builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .credentials_provider(Credentials::new(
                    access_key.clone(),
                    secret_key.clone(),
                    None,
                    None,
                    "tutora-static",
                )),
            _ => {
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(region.clone())
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&sdk_config)
            }
        };

        builder = builder
            .region(region)
            .endpoint_url(config.endpoint_url())
            .retry_config(retry_config)
            .force_path_style(true);

        tracing::debug!(
            endpoint = %config.endpoint_url(),
            bucket = %config.bucket,
            region = %config.region,
            "S3 client configured"
        );

        Ok(S3Store {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            public_base_url: format!(
                "{}/{}",
                config.public_base_url().trim_end_matches('/'),
                config.bucket
            ),
            public_policy: config.public_policy,
        })
    }

    /// Anonymous read access to every object in the bucket.
    fn public_read_policy(&self) -> String {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "AWS": ["*"] },
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{}/*", self.bucket)]
            }]
        })
        .to_string()
    }

    async fn create_bucket(&self) -> StorageResult<()> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(|e| {
            tracing::error!(error = %e, bucket = %self.bucket, "S3 create_bucket failed");
            StorageError::ProvisioningFailed(e.to_string())
        })?;

        tracing::info!(bucket = %self.bucket, "Bucket created");

        if self.public_policy {
            self.client
                .put_bucket_policy()
                .bucket(&self.bucket)
                .policy(self.public_read_policy())
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, bucket = %self.bucket, "S3 put_bucket_policy failed");
                    StorageError::ProvisioningFailed(e.to_string())
                })?;
            tracing::info!(bucket = %self.bucket, "Public read policy applied");
        }

        Ok(())
    }
}

#[async_trait]
impl DurableStore for S3Store {
    async fn ensure_bucket(&self) -> StorageResult<()> {
        let start = std::time::Instant::now();

        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                tracing::debug!(
                    bucket = %self.bucket,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Bucket exists"
                );
                Ok(())
            }
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                tracing::info!(bucket = %self.bucket, "Bucket missing, creating");
                self.create_bucket().await
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    bucket = %self.bucket,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 head_bucket failed"
                );
                Err(StorageError::Unreachable(e.to_string()))
            }
        }
    }

    async fn put_file(
        &self,
        object_name: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String> {
        let start = std::time::Instant::now();
        let size = tokio::fs::metadata(path).await?.len();

        let body = ByteStream::from_path(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open {}: {}", path.display(), e))
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_name)
            .body(body)
            .content_type(content_type)
            .content_length(size as i64)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %object_name,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %object_name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(self.object_url(object_name))
    }

    async fn exists(&self, object_name: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(object_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn delete(&self, object_name: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(object_name)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        tracing::info!(bucket = %self.bucket, key = %object_name, "S3 delete successful");
        Ok(())
    }

    fn base_url(&self) -> String {
        self.public_base_url.clone()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_config() -> StoreConfig {
        StoreConfig {
            backend: StorageBackend::S3,
            endpoint: "localhost".to_string(),
            port: 9000,
            use_ssl: false,
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            region: "us-east-1".to_string(),
            bucket: "videos".to_string(),
            public_policy: true,
            probe_timeout_secs: 10,
            upload_timeout_secs: 300,
            recheck_interval_secs: 30,
        }
    }

    #[tokio::test]
    async fn test_object_url_uses_path_style() {
        let store = S3Store::new(&store_config()).await.unwrap();
        assert_eq!(store.base_url(), "http://localhost:9000/videos");
        assert_eq!(
            store.object_url("lesson1.mp4"),
            "http://localhost:9000/videos/lesson1.mp4"
        );
    }

    #[tokio::test]
    async fn test_public_policy_targets_bucket_objects() {
        let store = S3Store::new(&store_config()).await.unwrap();
        let policy: serde_json::Value = serde_json::from_str(&store.public_read_policy()).unwrap();
        assert_eq!(
            policy["Statement"][0]["Resource"][0],
            "arn:aws:s3:::videos/*"
        );
    }

    #[tokio::test]
    async fn test_empty_bucket_is_rejected() {
        let mut config = store_config();
        config.bucket = "  ".to_string();
        assert!(matches!(
            S3Store::new(&config).await,
            Err(StorageError::ConfigError(_))
        ));
    }
}
