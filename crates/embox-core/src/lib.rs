//! Embox Core Library
//!
//! This crate provides the domain model, canonical path derivation, error types and
//! configuration shared by the storage, processing and API crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod paths;

// Re-export commonly used types
pub use config::{BaseConfig, Config, LogFormat, MediaServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Location, MediaAsset, MediaId, MediaKind, MediaUploadMeta, NewMediaAsset};
pub use paths::{local_thumbnail_path, remote_path, CanonicalPaths};
