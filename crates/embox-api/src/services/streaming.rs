//! Read path: originals streamed from the remote store, thumbnails from the local cache.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use embox_core::constants::{IMMUTABLE_CACHE_CONTROL, THUMBNAIL_CONTENT_TYPE};
use embox_core::{AppError, MediaAsset, MediaId};
use embox_db::MediaRepository;
use embox_processing::sniff_content_type;
use embox_storage::{ByteStream, LocalThumbnailCache, RemoteStorage};
use std::sync::Arc;

/// Request headers never forwarded to the signed URL.
const STRIPPED_REQUEST_HEADERS: [&str; 11] = [
    "host",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "upgrade",
    "proxy-authorization",
    "proxy-connection",
    "trailer",
    "authorization",
    "accept-encoding",
];

/// Upstream response headers relayed to the client.
const RELAYED_RESPONSE_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
];

/// An original on its way from the remote store to the client.
pub struct ProxiedOriginal {
    /// Upstream status, 200 or 206
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl IntoResponse for ProxiedOriginal {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from_stream(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub data: Bytes,
    pub content_type: &'static str,
    /// The asset has no cached thumbnail and the placeholder stands in for it
    pub is_placeholder: bool,
}

impl IntoResponse for Thumbnail {
    fn into_response(self) -> Response {
        let cache_control = if self.is_placeholder {
            "no-cache"
        } else {
            IMMUTABLE_CACHE_CONTROL
        };
        (
            [
                (header::CONTENT_TYPE, self.content_type),
                (header::CACHE_CONTROL, cache_control),
            ],
            self.data,
        )
            .into_response()
    }
}

pub struct StreamingProxy {
    repository: Arc<dyn MediaRepository>,
    remote: Arc<dyn RemoteStorage>,
    cache: LocalThumbnailCache,
    placeholder: Bytes,
    placeholder_content_type: &'static str,
}

impl StreamingProxy {
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        remote: Arc<dyn RemoteStorage>,
        cache: LocalThumbnailCache,
        placeholder: Bytes,
    ) -> Self {
        let placeholder_content_type = sniff_content_type(&placeholder);
        Self {
            repository,
            remote,
            cache,
            placeholder,
            placeholder_content_type,
        }
    }

    async fn lookup(&self, id: MediaId) -> Result<MediaAsset, AppError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", id)))
    }

    /// Stream the original of `id`, honouring the client's range and conditional headers.
    ///
    /// The upstream status is relayed as-is so a ranged request stays a 206. The body is
    /// never buffered; dropping the response closes the upstream connection.
    #[tracing::instrument(skip(self, request_headers), fields(media_id = id))]
    pub async fn serve_original(
        &self,
        id: MediaId,
        request_headers: &HeaderMap,
    ) -> Result<ProxiedOriginal, AppError> {
        let asset = self.lookup(id).await?;
        let remote_path = asset.paths().remote;

        let download = self
            .remote
            .download(&remote_path, passthrough_headers(request_headers))
            .await?;

        let mut headers = HeaderMap::new();
        for name in RELAYED_RESPONSE_HEADERS {
            if let Some(value) = download.headers.get(&name) {
                headers.insert(name, value.clone());
            }
        }
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL),
        );
        if let Ok(value) = HeaderValue::from_str(&http_date(asset.updated_at)) {
            headers.insert(header::LAST_MODIFIED, value);
        }

        tracing::debug!(
            remote_path = %remote_path,
            status = download.status.as_u16(),
            "Streaming original"
        );

        Ok(ProxiedOriginal {
            status: download.status,
            headers,
            body: download.body,
        })
    }

    /// The cached thumbnail of `id`, or the placeholder when there is none.
    ///
    /// Only an unknown asset id is an error.
    pub async fn serve_thumbnail(&self, id: MediaId) -> Result<Thumbnail, AppError> {
        let asset = self.lookup(id).await?;
        let local_path = asset.paths().local_thumbnail;

        match self.cache.get(&local_path).await {
            Ok(Some(data)) => {
                let content_type = if asset.has_thumbnail() {
                    THUMBNAIL_CONTENT_TYPE
                } else {
                    sniff_content_type(&data)
                };
                return Ok(Thumbnail {
                    data: Bytes::from(data),
                    content_type,
                    is_placeholder: false,
                });
            }
            Ok(None) => {
                tracing::debug!(media_id = id, local_path = %local_path, "Thumbnail miss, serving placeholder");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    media_id = id,
                    local_path = %local_path,
                    "Thumbnail read failed, serving placeholder"
                );
            }
        }

        Ok(Thumbnail {
            data: self.placeholder.clone(),
            content_type: self.placeholder_content_type,
            is_placeholder: true,
        })
    }
}

/// Caller headers with `Host`, hop-by-hop headers, client credentials and
/// `Accept-Encoding` removed.
///
/// Headers named in the caller's `Connection` header are hop-by-hop too.
pub fn passthrough_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = incoming.clone();

    let connection_tokens: Vec<String> = incoming
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();
    for token in &connection_tokens {
        headers.remove(token.as_str());
    }

    for name in STRIPPED_REQUEST_HEADERS {
        headers.remove(name);
    }

    headers
}

/// IMF-fixdate, as used by `Last-Modified`.
fn http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
