//! Data models for the application
//!
//! The media pipeline only owns one entity: the uploaded asset. Users, albums and
//! favourites belong to collaborators and are not modelled here.

mod media;

// Re-export all models for convenient imports
pub use media::{
    file_extension, parse_capture_date, Location, MediaAsset, MediaId, MediaKind,
    MediaUploadMeta, NewMediaAsset,
};
