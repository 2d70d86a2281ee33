//! Embox Processing Library
//!
//! Turns uploaded originals into canonical thumbnails: EXIF orientation correction,
//! bounded Lanczos resize and lossy WebP encoding for images, plus poster-frame
//! extraction through an external decoder for videos.

pub mod error;
pub mod image;
pub mod placeholder;
pub mod transcoder;
pub mod video;

pub use crate::image::{normalize_image, read_exif_orientation, ExifOrientation};
pub use error::TranscodeError;
pub use placeholder::{load_placeholder, render_placeholder, sniff_content_type};
pub use transcoder::{ThumbnailSettings, ThumbnailTranscoder};
pub use video::{FfmpegPosterExtractor, PosterFrameExtractor};
