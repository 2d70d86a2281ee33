//! Image path of the transcoder
//!
//! - EXIF orientation lookup and correction (orientation)
//! - Bounded resize and WebP encoding (thumbnail)

pub mod orientation;
pub mod thumbnail;

pub use orientation::{read_exif_orientation, ExifOrientation};
pub use thumbnail::normalize_image;
