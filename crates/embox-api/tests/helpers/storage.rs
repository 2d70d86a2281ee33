//! In-process stand-ins for the remote store and the poster extractor.

use super::fixtures;
use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use bytes::Bytes;
use embox_core::MediaId;
use embox_processing::{PosterFrameExtractor, TranscodeError};
use embox_storage::{RemoteDownload, RemoteStorage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Remote store keeping objects in a map.
///
/// Answers `Range: bytes=a-b` with a 206 the way the real file server does, and records
/// the headers of the last download so tests can check what was forwarded.
#[derive(Default)]
pub struct MemoryRemote {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    last_download_headers: Mutex<Option<HeaderMap>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    rejected_suffix: Mutex<Option<String>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Fail uploads whose path ends with `suffix`, accept the rest.
    pub fn reject_uploads_ending_with(&self, suffix: &str) {
        *self.rejected_suffix.lock().unwrap() = Some(suffix.to_string());
    }

    /// Make every delete answer like the server's HTTP 500.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn last_download_headers(&self) -> Option<HeaderMap> {
        self.last_download_headers.lock().unwrap().clone()
    }
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "mp4" => "video/mp4",
        Some(ext) if ext == "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// `bytes=a-b` with both ends present; anything fancier is served in full.
fn parse_range(value: &str, len: usize) -> Option<(usize, usize)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    let start: usize = start.parse().ok()?;
    let end: usize = end.parse().ok()?;
    (start <= end && end < len).then_some((start, end))
}

#[async_trait]
impl RemoteStorage for MemoryRemote {
    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        let rejected = self
            .rejected_suffix
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|suffix| path.ends_with(suffix));
        if rejected || self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("HTTP 500".to_string()));
        }
        self.objects.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }

    async fn download(&self, path: &str, passthrough: HeaderMap) -> StorageResult<RemoteDownload> {
        let data = self
            .object(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        let range = passthrough
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_range(v, data.len()));
        *self.last_download_headers.lock().unwrap() = Some(passthrough);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type_for(path)),
        );
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        // Never relayed to the client
        headers.insert(header::SET_COOKIE, HeaderValue::from_static("seahub=1"));

        let (status, body) = match range {
            Some((start, end)) => {
                headers.insert(
                    header::CONTENT_RANGE,
                    HeaderValue::from_str(&format!("bytes {}-{}/{}", start, end, data.len()))
                        .unwrap(),
                );
                (StatusCode::PARTIAL_CONTENT, data[start..=end].to_vec())
            }
            None => (StatusCode::OK, data),
        };
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        // Two chunks so the proxy has to stream rather than hand over one buffer.
        let mid = body.len() / 2;
        let chunks: Vec<Result<Bytes, StorageError>> = vec![
            Ok(Bytes::copy_from_slice(&body[..mid])),
            Ok(Bytes::copy_from_slice(&body[mid..])),
        ];

        Ok(RemoteDownload {
            status,
            headers,
            body: Box::pin(futures::stream::iter(chunks)),
        })
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("HTTP 500".to_string()));
        }
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }
}

/// Poster extractor returning a fixed 1280x720 frame, or failing on demand.
#[derive(Default)]
pub struct FakePoster {
    pub calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakePoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let poster = Self::default();
        poster.fail.store(true, Ordering::SeqCst);
        poster
    }
}

#[async_trait]
impl PosterFrameExtractor for FakePoster {
    async fn extract_poster(
        &self,
        _id: MediaId,
        _video: &[u8],
        _max_dimension: u32,
    ) -> Result<Vec<u8>, TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TranscodeError::TranscodeFailed(
                "moov atom not found".to_string(),
            ));
        }
        Ok(fixtures::png(1280, 720))
    }
}
