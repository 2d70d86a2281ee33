//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use embox_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Embox API",
        version = "0.1.0",
        description = "Photo, video and audio storage. Originals live in a remote object store and are streamed back with byte-range support; images and videos get a WebP thumbnail served from a local cache."
    ),
    paths(
        handlers::media_upload::upload_media,
        handlers::media_thumbnail::get_thumbnail,
        handlers::media_file::get_file,
        handlers::media_delete::delete_media,
    ),
    components(schemas(
        models::MediaAsset,
        models::MediaKind,
        models::Location,
        models::MediaUploadMeta,
        handlers::media_delete::DeleteMediaRequest,
        handlers::media_delete::DeleteMediaResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "media", description = "Upload, serve and delete media")
    )
)]
pub struct ApiDoc;
