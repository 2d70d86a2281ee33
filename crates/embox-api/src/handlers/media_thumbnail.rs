use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use embox_core::MediaId;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/media/{id}/thumbnail",
    tag = "media",
    params(
        ("id" = u64, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Thumbnail, or the placeholder when the asset has none", content_type = "image/webp"),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
pub async fn get_thumbnail(
    Path(id): Path<MediaId>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let thumbnail = state.proxy.serve_thumbnail(id).await?;
    Ok(thumbnail)
}
