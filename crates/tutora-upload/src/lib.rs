//! Tutora Upload Library
//!
//! The chunked video upload pipeline. A client splits a file into chunks and
//! posts them in order; the receiver stages each chunk on disk, the final
//! chunk triggers reassembly into the upload directory, and the publisher
//! pushes the result to the durable object store or falls back to serving it
//! locally.

pub mod cleanup;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod publisher;
pub mod reassembler;
pub mod receiver;
pub mod retry;
pub mod session;

pub use cleanup::prepare_staging;
pub use error::{UploadError, UploadResult};
pub use health::{HealthEvent, PublishDecision, StoreHealth, StoreHealthTracker};
pub use pipeline::{ChunkOutcome, UploadPipeline};
pub use publisher::{PublishOutcome, Publisher};
pub use reassembler::{DiskPartFiles, PartFiles, PartReader, ReassembledFile, Reassembler};
pub use receiver::{ChunkFields, ChunkReceiver, ChunkRequest};
pub use retry::RetryPolicy;
pub use session::{SessionRegistry, UploadSession};
