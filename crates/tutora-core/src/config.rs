//! Configuration module
//!
//! This module provides configuration structures for the upload service:
//! server, staging directories, durable object store, and chunk retry settings.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 5000;
const MAX_UPLOAD_SIZE_MB: usize = 100;
const STORE_PORT: u16 = 9000;
const STORE_PROBE_TIMEOUT_SECS: u64 = 10;
const STORE_UPLOAD_TIMEOUT_SECS: u64 = 300;
const STORE_RECHECK_INTERVAL_SECS: u64 = 30;
const CHUNK_RETRY_ATTEMPTS: u32 = 5;
const CHUNK_RETRY_DELAY_MS: u64 = 1000;
const UPLOAD_SESSION_TTL_SECS: u64 = 3600;
const MIN_API_TOKEN_LEN: usize = 16;

/// Base configuration for the HTTP server
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub public_base_url: String,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub api_token: String,
}

/// Durable object store configuration
#[derive(Clone)]
pub struct StoreConfig {
    pub backend: StorageBackend,
    pub endpoint: String,
    pub port: u16,
    pub use_ssl: bool,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: String,
    pub bucket: String,
    pub public_policy: bool,
    pub probe_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub recheck_interval_secs: u64,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &self.access_key.as_ref().map(|_| "[REDACTED]"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("public_policy", &self.public_policy)
            .finish()
    }
}

impl StoreConfig {
    /// Endpoint URL (`http[s]://host:port`) used by the S3 client.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.endpoint, self.port)
    }

    /// Public base for object URLs; the port is omitted when it is the scheme default.
    pub fn public_base_url(&self) -> String {
        let (scheme, default_port) = if self.use_ssl {
            ("https", 443)
        } else {
            ("http", 80)
        };
        if self.port == default_port {
            format!("{}://{}", scheme, self.endpoint)
        } else {
            format!("{}://{}:{}", scheme, self.endpoint, self.port)
        }
    }
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct UploadServiceConfig {
    pub base: BaseConfig,
    pub store: StoreConfig,
    pub upload_dir: PathBuf,
    pub chunk_dir: PathBuf,
    pub uploads_url_path: String,
    pub max_upload_size_bytes: usize,
    pub chunk_retry_attempts: u32,
    pub chunk_retry_delay_ms: u64,
    pub upload_session_ttl_secs: u64,
    pub clean_uploads_on_start: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadServiceConfig>);

impl Config {
    fn inner(&self) -> &UploadServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = UploadServiceConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn public_base_url(&self) -> &str {
        &self.inner().base.public_base_url
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn api_token(&self) -> &str {
        &self.inner().base.api_token
    }

    pub fn store(&self) -> &StoreConfig {
        &self.inner().store
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().store.backend
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.inner().upload_dir
    }

    pub fn chunk_dir(&self) -> &PathBuf {
        &self.inner().chunk_dir
    }

    pub fn uploads_url_path(&self) -> &str {
        &self.inner().uploads_url_path
    }

    /// Base URL under which the staging directory is served (fallback `videoUrl` prefix).
    pub fn local_files_base_url(&self) -> String {
        format!(
            "{}{}",
            self.public_base_url().trim_end_matches('/'),
            self.uploads_url_path()
        )
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn chunk_retry_attempts(&self) -> u32 {
        self.inner().chunk_retry_attempts
    }

    pub fn chunk_retry_delay(&self) -> Duration {
        Duration::from_millis(self.inner().chunk_retry_delay_ms)
    }

    pub fn store_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().store.probe_timeout_secs)
    }

    pub fn store_upload_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().store.upload_timeout_secs)
    }

    pub fn store_recheck_interval(&self) -> Duration {
        Duration::from_secs(self.inner().store.recheck_interval_secs)
    }

    pub fn upload_session_ttl(&self) -> Duration {
        Duration::from_secs(self.inner().upload_session_ttl_secs)
    }

    pub fn clean_uploads_on_start(&self) -> bool {
        self.inner().clean_uploads_on_start
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|s| s.trim().to_lowercase())
        .and_then(|s| match s.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// `<UPLOAD_DIR>-chunks`, next to the served upload directory.
fn default_chunk_dir(upload_dir: &Path) -> PathBuf {
    match upload_dir.file_name() {
        Some(name) => upload_dir.with_file_name(format!("{}-chunks", name.to_string_lossy())),
        None => PathBuf::from("chunks"),
    }
}

impl UploadServiceConfig {
    /// Build the configuration from a key lookup (the process environment in production).
    pub fn from_lookup<F>(get: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|s| !s.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port = parse_or(non_empty("SERVER_PORT"), SERVER_PORT);
        let public_base_url = non_empty("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", server_port));

        let cors_origins = non_empty("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let upload_dir = PathBuf::from(non_empty("UPLOAD_DIR").unwrap_or_else(|| "uploads".into()));
        let chunk_dir = non_empty("CHUNK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_chunk_dir(&upload_dir));

        let backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        let store = StoreConfig {
            backend,
            endpoint: non_empty("STORE_ENDPOINT").unwrap_or_else(|| "localhost".to_string()),
            port: parse_or(non_empty("STORE_PORT"), STORE_PORT),
            use_ssl: parse_bool(non_empty("STORE_USE_SSL"), false),
            access_key: non_empty("STORE_ACCESS_KEY"),
            secret_key: non_empty("STORE_SECRET_KEY"),
            region: non_empty("STORE_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            bucket: non_empty("STORE_BUCKET").unwrap_or_else(|| "videos".to_string()),
            public_policy: parse_bool(non_empty("STORE_PUBLIC_POLICY"), true),
            probe_timeout_secs: parse_or(
                non_empty("STORE_PROBE_TIMEOUT_SECS"),
                STORE_PROBE_TIMEOUT_SECS,
            ),
            upload_timeout_secs: parse_or(
                non_empty("STORE_UPLOAD_TIMEOUT_SECS"),
                STORE_UPLOAD_TIMEOUT_SECS,
            ),
            recheck_interval_secs: parse_or(
                non_empty("STORE_RECHECK_INTERVAL_SECS"),
                STORE_RECHECK_INTERVAL_SECS,
            ),
        };

        let config = UploadServiceConfig {
            base: BaseConfig {
                server_port,
                public_base_url,
                cors_origins,
                environment,
                api_token: non_empty("API_TOKEN").unwrap_or_default(),
            },
            store,
            upload_dir,
            chunk_dir,
            uploads_url_path: non_empty("UPLOADS_URL_PATH")
                .map(|p| p.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "/uploads".to_string()),
            max_upload_size_bytes: parse_or(non_empty("MAX_UPLOAD_SIZE_MB"), MAX_UPLOAD_SIZE_MB)
                * 1024
                * 1024,
            chunk_retry_attempts: parse_or(non_empty("CHUNK_RETRY_ATTEMPTS"), CHUNK_RETRY_ATTEMPTS),
            chunk_retry_delay_ms: parse_or(non_empty("CHUNK_RETRY_DELAY_MS"), CHUNK_RETRY_DELAY_MS),
            upload_session_ttl_secs: parse_or(
                non_empty("UPLOAD_SESSION_TTL_SECS"),
                UPLOAD_SESSION_TTL_SECS,
            ),
            clean_uploads_on_start: parse_bool(non_empty("CLEAN_UPLOADS_ON_START"), true),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.api_token.len() < MIN_API_TOKEN_LEN {
            return Err(anyhow::anyhow!(
                "API_TOKEN must be at least {} characters long",
                MIN_API_TOKEN_LEN
            ));
        }

        if !self.uploads_url_path.starts_with('/') || self.uploads_url_path.len() < 2 {
            return Err(anyhow::anyhow!(
                "UPLOADS_URL_PATH must start with '/' and name a path segment"
            ));
        }

        // The upload directory is served as-is, so staged parts must not live under it.
        if self.chunk_dir.starts_with(&self.upload_dir) || self.upload_dir.starts_with(&self.chunk_dir)
        {
            return Err(anyhow::anyhow!(
                "CHUNK_DIR ({}) and UPLOAD_DIR ({}) must not contain each other",
                self.chunk_dir.display(),
                self.upload_dir.display()
            ));
        }

        if self.chunk_retry_attempts == 0 {
            return Err(anyhow::anyhow!("CHUNK_RETRY_ATTEMPTS must be at least 1"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.store.probe_timeout_secs == 0 || self.store.upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "STORE_PROBE_TIMEOUT_SECS and STORE_UPLOAD_TIMEOUT_SECS must be greater than 0"
            ));
        }

        if self.store.backend == StorageBackend::S3
            && (self.store.access_key.is_none() || self.store.secret_key.is_none())
        {
            return Err(anyhow::anyhow!(
                "STORE_ACCESS_KEY and STORE_SECRET_KEY must be set when using the s3 storage backend"
            ));
        }

        let env = self.base.environment.to_lowercase();
        if (env == "production" || env == "prod") && self.base.cors_origins.iter().any(|o| o == "*")
        {
            return Err(anyhow::anyhow!(
                "CORS configured to allow all origins (*) in production. \
                Set specific allowed origins via CORS_ORIGINS."
            ));
        }

        Ok(())
    }
}
