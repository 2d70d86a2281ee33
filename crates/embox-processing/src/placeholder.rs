//! Fallback image served when an asset has no cached thumbnail.

use crate::error::TranscodeError;
use crate::image::thumbnail::encode_webp;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;

const PLACEHOLDER_FILL: Rgba<u8> = Rgba([200, 200, 200, 255]);

/// A flat grey `size`×`size` WebP square.
pub fn render_placeholder(size: u32, quality: u8) -> Result<Vec<u8>, TranscodeError> {
    let img = RgbaImage::from_pixel(size.max(1), size.max(1), PLACEHOLDER_FILL);
    encode_webp(&DynamicImage::ImageRgba8(img), quality)
}

/// Load the configured placeholder file, or render the built-in one when no path is set.
pub async fn load_placeholder(
    path: Option<&Path>,
    size: u32,
    quality: u8,
) -> Result<Vec<u8>, TranscodeError> {
    match path {
        Some(path) => {
            let data = tokio::fs::read(path).await?;
            tracing::info!(
                path = %path.display(),
                content_type = sniff_content_type(&data),
                "Loaded placeholder image"
            );
            Ok(data)
        }
        None => render_placeholder(size, quality),
    }
}

/// Best-effort MIME type of an image held in memory.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}
