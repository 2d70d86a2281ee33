//! Application-wide constants

/// Extension of every generated thumbnail (image and video kinds).
pub const THUMBNAIL_EXTENSION: &str = "webp";

/// MIME type of generated thumbnails.
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/webp";

/// Default bound on the longer side of a thumbnail, in pixels.
pub const DEFAULT_THUMBNAIL_MAX_DIMENSION: u32 = 512;

/// Default lossy quality factor for thumbnails (0-100).
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;

/// Cache directive for originals and thumbnails. Both are immutable once written.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
