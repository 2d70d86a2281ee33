use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::paths::CanonicalPaths;

/// Integer identity allocated by the metadata store.
pub type MediaId = u64;

/// Media kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaKind {
    /// Classify an upload by the top-level type of its MIME type.
    pub fn from_content_type(content_type: &str) -> Self {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.starts_with("image") {
            MediaKind::Image
        } else if content_type.starts_with("video") {
            MediaKind::Video
        } else if content_type.starts_with("audio") {
            MediaKind::Audio
        } else {
            MediaKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other => "other",
        }
    }

    /// Thumbnails are only ever produced for images and videos.
    pub fn has_thumbnail(&self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            "other" => Ok(MediaKind::Other),
            _ => Err(AppError::InvalidInput(format!("Invalid media kind: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single uploaded photo, video or audio item.
///
/// There is deliberately no path field: the remote and local-thumbnail locations are
/// always recomputed from `(captured_on, id, file_ext, kind)` via [`CanonicalPaths`].
/// Changing `captured_on` after artifacts were written orphans them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MediaAsset {
    pub id: MediaId,
    /// Capture date, day precision
    pub captured_on: NaiveDate,
    pub kind: MediaKind,
    /// Extension of the original upload, case preserved, without the dot
    pub file_ext: String,
    pub caption: String,
    /// Orientation hint supplied by the client (degrees or EXIF code)
    pub orientation: Option<String>,
    pub location: Option<Location>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaAsset {
    pub fn paths(&self) -> CanonicalPaths {
        CanonicalPaths::for_asset(self)
    }

    pub fn has_thumbnail(&self) -> bool {
        self.kind.has_thumbnail()
    }
}

/// Attributes of an asset that does not have an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMediaAsset {
    pub captured_on: NaiveDate,
    pub kind: MediaKind,
    pub file_ext: String,
    pub caption: String,
    pub orientation: Option<String>,
    pub location: Option<Location>,
    pub is_public: bool,
}

impl NewMediaAsset {
    pub fn new(captured_on: NaiveDate, kind: MediaKind, file_ext: impl Into<String>) -> Self {
        Self {
            captured_on,
            kind,
            file_ext: file_ext.into(),
            caption: String::new(),
            orientation: None,
            location: None,
            is_public: false,
        }
    }
}

/// Per-file metadata sent by clients alongside a multipart upload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadMeta {
    /// MIME type of the file, e.g. "image/jpeg"
    #[serde(rename = "type")]
    pub content_type: String,
    pub file_name: String,
    /// RFC 3339 timestamp, naive ISO timestamp or plain date
    pub date: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub location_lat: Option<f64>,
    #[serde(default)]
    pub location_lng: Option<f64>,
}

impl TryFrom<MediaUploadMeta> for NewMediaAsset {
    type Error = AppError;

    fn try_from(meta: MediaUploadMeta) -> Result<Self, Self::Error> {
        let captured_on = parse_capture_date(&meta.date)?;
        let location = match (meta.location_lat, meta.location_lng) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(NewMediaAsset {
            captured_on,
            kind: MediaKind::from_content_type(&meta.content_type),
            file_ext: file_extension(&meta.file_name).to_string(),
            caption: meta.caption,
            orientation: meta.orientation.filter(|o| !o.trim().is_empty()),
            location,
            is_public: meta.is_public,
        })
    }
}

/// Extension after the last dot of `file_name`, or an empty string when there is none.
pub fn file_extension(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
}

/// Parse a client-supplied capture timestamp down to its calendar date.
///
/// Accepts RFC 3339 (the date is taken in the timestamp's own offset), a naive
/// `YYYY-MM-DDTHH:MM:SS` timestamp, or a bare `YYYY-MM-DD` date.
pub fn parse_capture_date(value: &str) -> Result<NaiveDate, AppError> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }

    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(timestamp.date());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("Invalid date format: {}", value)))
}
