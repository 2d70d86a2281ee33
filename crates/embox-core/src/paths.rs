//! Canonical artifact locations
//!
//! Remote originals and local thumbnails are never stored on the asset; both the ingest
//! and the serving paths derive them here from `(captured_on, id, file_ext, kind)`.

use chrono::NaiveDate;

use crate::constants::THUMBNAIL_EXTENSION;
use crate::models::{MediaAsset, MediaId, MediaKind};

/// Both locations of one asset, as slash-separated relative keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPaths {
    /// `yyyy/mm/dd_{id}.{originalExt}`
    pub remote: String,
    /// `yyyy/mm/dd_{id}.{thumbExt}`
    pub local_thumbnail: String,
}

impl CanonicalPaths {
    pub fn derive(captured_on: NaiveDate, id: MediaId, kind: MediaKind, file_ext: &str) -> Self {
        Self {
            remote: build_key(captured_on, id, file_ext),
            local_thumbnail: build_key(captured_on, id, thumbnail_extension(kind, file_ext)),
        }
    }

    pub fn for_asset(asset: &MediaAsset) -> Self {
        Self::derive(asset.captured_on, asset.id, asset.kind, &asset.file_ext)
    }
}

pub fn remote_path(asset: &MediaAsset) -> String {
    build_key(asset.captured_on, asset.id, &asset.file_ext)
}

pub fn local_thumbnail_path(asset: &MediaAsset) -> String {
    build_key(
        asset.captured_on,
        asset.id,
        thumbnail_extension(asset.kind, &asset.file_ext),
    )
}

fn thumbnail_extension(kind: MediaKind, file_ext: &str) -> &str {
    if kind.has_thumbnail() {
        THUMBNAIL_EXTENSION
    } else {
        file_ext
    }
}

fn build_key(captured_on: NaiveDate, id: MediaId, ext: &str) -> String {
    format!("{}_{}.{}", captured_on.format("%Y/%m/%d"), id, ext)
}
