//! Remote storage abstraction
//!
//! This module defines the [`RemoteStorage`] trait the ingest pipeline and streaming proxy
//! are written against, plus the error type shared by every store in this crate.

use async_trait::async_trait;
use bytes::Bytes;
use embox_core::AppError;
use futures::{Stream, TryStreamExt};
use http::{header, HeaderMap, StatusCode};
use std::fmt;
use std::pin::Pin;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AuthFailed(msg) => AppError::StorageAuth(msg),
            StorageError::UploadFailed(msg) => AppError::UploadFailed(msg),
            StorageError::DownloadFailed(msg) => AppError::DownloadFailed(msg),
            StorageError::DeleteFailed(msg) => AppError::DeleteFailed(msg),
            StorageError::NotFound(msg) => AppError::NotFound(format!("File not found: {}", msg)),
            StorageError::InvalidKey(msg) => {
                AppError::Internal(format!("Invalid storage key: {}", msg))
            }
            StorageError::IoError(e) => AppError::Internal(format!("Storage IO error: {}", e)),
            StorageError::ConfigError(msg) => {
                AppError::Internal(format!("Storage configuration error: {}", msg))
            }
        }
    }
}

/// Body of a live download, yielded chunk by chunk as it arrives from upstream.
/// Dropping the stream closes the upstream connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// An upstream response whose body has not been read yet.
pub struct RemoteDownload {
    /// 200 or 206, exactly as the remote store answered
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl RemoteDownload {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

impl fmt::Debug for RemoteDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDownload")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Durable store for original media files.
///
/// Paths are the canonical remote paths (`yyyy/mm/dd_{id}.{ext}`) without a leading slash.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Store `data` at `path`, overwriting whatever is there.
    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Open a live download of `path`.
    ///
    /// Every header in `passthrough` is sent to the remote store verbatim, so `Range`,
    /// `If-Modified-Since` and friends behave as if the caller talked to it directly.
    async fn download(&self, path: &str, passthrough: HeaderMap)
        -> StorageResult<RemoteDownload>;

    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Read the whole object into memory, along with its content type.
    async fn download_bytes(&self, path: &str) -> StorageResult<(Vec<u8>, Option<String>)> {
        let download = self.download(path, HeaderMap::new()).await?;
        let content_type = download.content_type().map(str::to_string);
        let data = download
            .body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        Ok((data, content_type))
    }
}
