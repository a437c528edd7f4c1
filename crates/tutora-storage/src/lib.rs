//! Tutora Storage Library
//!
//! Storage for the video upload pipeline: the local staging directory that
//! holds chunks and reassembled files, and the durable object stores a
//! reassembled file is published to.
//!
//! # Key format
//!
//! Storage keys are flat file names. A chunk is stored as
//! `{upload_key}.part_{index}`; the reassembled file and the published object
//! are both named `{upload_key}`. Keys must not contain `/`, `\` or `..`.
//! Key generation is centralized in the `keys` module so the receiver,
//! reassembler and publisher stay consistent.

pub mod factory;
pub mod keys;
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_durable_store;
pub use local::LocalStorage;
pub use memory::MemoryStore;
#[cfg(feature = "storage-s3")]
pub use s3::S3Store;
pub use traits::{DurableStore, StorageError, StorageResult};
pub use tutora_core::StorageBackend;
