use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use embox_core::{AppError, MediaAsset, MediaUploadMeta, NewMediaAsset};
use std::sync::Arc;

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart form: {}", e.body_text()))
    }
}

/// Upload one or more files.
///
/// The form carries the files under `files` and a `meta` field holding a JSON array with
/// one entry per file, in the same order.
#[utoipa::path(
    post,
    path = "/api/media",
    tag = "media",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Media created", body = [MediaAsset]),
        (status = 400, description = "Malformed form or metadata", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 502, description = "Remote storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_media"))]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut files: Vec<Bytes> = Vec::new();
    let mut meta: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "files[]" => files.push(field.bytes().await.map_err(multipart_error)?),
            "meta" => meta = Some(field.text().await.map_err(multipart_error)?),
            _ => tracing::debug!(field = %name, "Ignoring unknown multipart field"),
        }
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".to_string()).into());
    }
    let meta = meta.ok_or_else(|| AppError::BadRequest("Missing meta field".to_string()))?;
    let meta_list: Vec<MediaUploadMeta> = serde_json::from_str(&meta)
        .map_err(|e| AppError::BadRequest(format!("Invalid meta data: {}", e)))?;
    if meta_list.len() != files.len() {
        return Err(AppError::BadRequest(format!(
            "Meta and files count mismatch: {} meta entries for {} files",
            meta_list.len(),
            files.len()
        ))
        .into());
    }

    let items = meta_list
        .into_iter()
        .zip(files)
        .map(|(meta, data)| NewMediaAsset::try_from(meta).map(|new_asset| (new_asset, data)))
        .collect::<Result<Vec<_>, AppError>>()?;

    let outcome = state.ingest.ingest_batch(items).await;
    if let Some(e) = outcome.failure {
        return Err(e.into());
    }

    let created: Vec<MediaAsset> = outcome.created;
    Ok((StatusCode::CREATED, Json(created)))
}
