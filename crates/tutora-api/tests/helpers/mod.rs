//! Test helpers: build the upload service around temp directories and an
//! in-memory durable store.
//!
//! Run from workspace root: `cargo test -p tutora-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tutora_api::constants;
use tutora_api::setup::build_app;
use tutora_core::config::UploadServiceConfig;
use tutora_core::Config;
use tutora_storage::{DurableStore, MemoryStore};

pub const TEST_API_TOKEN: &str = "test-api-token-0123456789";
pub const PUBLIC_BASE_URL: &str = "http://localhost:5000";
pub const STORE_BASE_URL: &str = "http://store.test/videos";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, store handle, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub store: Option<Arc<MemoryStore>>,
    pub upload_dir: PathBuf,
    pub chunk_dir: PathBuf,
    pub _temp_dir: TempDir,
    background: Vec<JoinHandle<()>>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn store(&self) -> &MemoryStore {
        self.store.as_deref().expect("test app has no durable store")
    }

    /// `.part_*` files currently staged.
    pub fn staged_parts(&self) -> Vec<String> {
        list_files(&self.chunk_dir)
            .into_iter()
            .filter(|name| name.contains(".part_"))
            .collect()
    }

    pub fn uploaded_file(&self, name: &str) -> PathBuf {
        self.upload_dir.join(name)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for handle in &self.background {
            handle.abort();
        }
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Setup test app with a reachable in-memory durable store.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_store(Some(Arc::new(MemoryStore::new(STORE_BASE_URL)))).await
}

/// Setup test app with an in-memory durable store that refuses every call.
pub async fn setup_test_app_store_down() -> TestApp {
    let store = Arc::new(MemoryStore::new(STORE_BASE_URL));
    store.set_available(false);
    setup_test_app_with_store(Some(store)).await
}

/// Setup test app with the given store; `None` runs local-only.
pub async fn setup_test_app_with_store(store: Option<Arc<MemoryStore>>) -> TestApp {
    let temp_dir = TempDir::new().expect("temp dir");
    let upload_dir = temp_dir.path().join("uploads");
    let chunk_dir = temp_dir.path().join("chunks");

    let backend = if store.is_some() { "memory" } else { "none" };
    let mut vars = HashMap::new();
    vars.insert("API_TOKEN", TEST_API_TOKEN.to_string());
    vars.insert("STORAGE_BACKEND", backend.to_string());
    vars.insert("PUBLIC_BASE_URL", PUBLIC_BASE_URL.to_string());
    vars.insert("UPLOAD_DIR", upload_dir.display().to_string());
    vars.insert("CHUNK_DIR", chunk_dir.display().to_string());
    vars.insert("CHUNK_RETRY_ATTEMPTS", "2".to_string());
    vars.insert("CHUNK_RETRY_DELAY_MS", "10".to_string());
    vars.insert("STORE_PROBE_TIMEOUT_SECS", "1".to_string());

    let config = UploadServiceConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("test config");
    let config = Config(Box::new(config));

    let durable = store.clone().map(|s| s as Arc<dyn DurableStore>);
    let (_state, router, background) = build_app(config, durable).await.expect("build app");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        store,
        upload_dir,
        chunk_dir,
        _temp_dir: temp_dir,
        background,
    }
}

pub fn bearer() -> String {
    format!("Bearer {}", TEST_API_TOKEN)
}

/// Multipart body of one chunk request.
pub fn chunk_form(data: Vec<u8>, index: u32, total: u32, name: &str, mime: &str) -> MultipartForm {
    let part = Part::bytes(Bytes::from(data))
        .file_name(name)
        .mime_type(mime);
    MultipartForm::new()
        .add_text("chunk", index.to_string())
        .add_text("totalChunks", total.to_string())
        .add_text("originalname", name)
        .add_part("video", part)
}

/// Chunk request bound to an upload session.
pub fn session_chunk_form(data: Vec<u8>, index: u32, total: u32, name: &str, upload_id: &str) -> MultipartForm {
    chunk_form(data, index, total, name, "video/mp4").add_text("uploadId", upload_id)
}

/// Deterministic content so reassembly order can be checked byte for byte.
pub fn chunk_bytes(index: u32, len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i as u32 + index * 7) % 251) as u8).collect()
}

/// POST one chunk with the test bearer token.
pub async fn post_chunk(client: &TestServer, form: MultipartForm) -> axum_test::TestResponse {
    client
        .post(&api_path("/videos/upload"))
        .add_header("Authorization", bearer())
        .multipart(form)
        .await
}
