//! Embox API Library
//!
//! This crate provides the ingest pipeline, the streaming proxy, the HTTP handlers that
//! expose them, and application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;
mod telemetry;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use services::{
    BatchIngest, DeleteSummary, MediaIngestPipeline, ProxiedOriginal, StreamingProxy, Thumbnail,
};
pub use state::AppState;
