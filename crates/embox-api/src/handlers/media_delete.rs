use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use embox_core::{AppError, MediaId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteMediaRequest {
    pub ids: Vec<MediaId>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteMediaResponse {
    pub message: String,
    /// Metadata rows removed; unknown ids are not counted
    pub deleted: u64,
}

#[utoipa::path(
    delete,
    path = "/api/media",
    tag = "media",
    request_body = DeleteMediaRequest,
    responses(
        (status = 200, description = "Media deleted; remote cleanup is best-effort", body = DeleteMediaResponse),
        (status = 400, description = "Missing or empty id list", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "delete_media", count = request.ids.len()))]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DeleteMediaRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if request.ids.is_empty() {
        return Err(AppError::BadRequest("No IDs provided".to_string()).into());
    }

    let summary = state.ingest.delete(&request.ids).await?;

    Ok(Json(DeleteMediaResponse {
        message: "Media deleted successfully".to_string(),
        deleted: summary.removed,
    }))
}
