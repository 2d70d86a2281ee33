//! Route configuration and setup.

mod health;

use crate::api_doc::ApiDoc;
use crate::constants::{API_PREFIX, MAX_UPLOAD_BYTES};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router<()> {
    let media_routes = Router::new()
        .route(
            &format!("{}/media", API_PREFIX),
            post(handlers::media_upload::upload_media).delete(handlers::media_delete::delete_media),
        )
        .route(
            &format!("{}/media/{{id}}/thumbnail", API_PREFIX),
            get(handlers::media_thumbnail::get_thumbnail),
        )
        .route(
            &format!("{}/media/{{id}}/file", API_PREFIX),
            get(handlers::media_file::get_file),
        )
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            &format!("{}/openapi.json", API_PREFIX),
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(media_routes)
        .merge(RapiDoc::new(format!("{}/openapi.json", API_PREFIX)).path("/docs"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
