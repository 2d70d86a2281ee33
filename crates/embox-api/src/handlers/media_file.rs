use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use embox_core::MediaId;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/media/{id}/file",
    tag = "media",
    params(
        ("id" = u64, Path, description = "Media ID"),
        ("Range" = Option<String>, Header, description = "Byte range, forwarded to storage")
    ),
    responses(
        (status = 200, description = "Full original", content_type = "application/octet-stream"),
        (status = 206, description = "Requested byte range of the original", content_type = "application/octet-stream"),
        (status = 404, description = "Media not found", body = ErrorResponse),
        (status = 502, description = "Remote storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers), fields(media_id = id, operation = "download_original"))]
pub async fn get_file(
    Path(id): Path<MediaId>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let original = state.proxy.serve_original(id, &headers).await?;
    Ok(original)
}
