//! Tutora API Library
//!
//! HTTP surface of the chunked video upload pipeline: routes, bearer auth,
//! error rendering, static serving of fallback files, health and OpenAPI.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod setup;
mod telemetry;

pub mod auth;
pub mod error;
pub mod state;

pub use error::ErrorResponse;
