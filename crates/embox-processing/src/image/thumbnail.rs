use super::orientation::{read_exif_orientation, ExifOrientation};
use crate::error::TranscodeError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Produce the WebP thumbnail of a raster image.
///
/// The image is rotated upright per its EXIF orientation, then shrunk (never enlarged)
/// so its longer side is at most `max_dimension`, aspect ratio kept. A WebP input that
/// needs neither step is returned as-is, which makes the operation idempotent on its own
/// output.
pub fn normalize_image(
    data: &[u8],
    max_dimension: u32,
    quality: u8,
) -> Result<Vec<u8>, TranscodeError> {
    let start = std::time::Instant::now();

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| TranscodeError::UnsupportedFormat(e.to_string()))?;
    let format = reader.format().ok_or_else(|| {
        TranscodeError::UnsupportedFormat("unrecognized image data".to_string())
    })?;
    let mut img = reader.decode().map_err(|e| {
        TranscodeError::UnsupportedFormat(format!("failed to decode {:?} image: {}", format, e))
    })?;

    let (source_width, source_height) = (img.width(), img.height());
    let mut transformed = false;

    let orientation = read_exif_orientation(data)
        .map(ExifOrientation::from_tag)
        .unwrap_or(ExifOrientation::Normal);
    if orientation.is_rotation() {
        img = orientation.apply(img);
        transformed = true;
    }

    if img.width().max(img.height()) > max_dimension {
        img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
        transformed = true;
    }

    if format == ImageFormat::WebP && !transformed {
        tracing::debug!(
            width = source_width,
            height = source_height,
            "WebP input already within bounds, kept as-is"
        );
        return Ok(data.to_vec());
    }

    let encoded = encode_webp(&img, quality)?;

    tracing::debug!(
        source_format = ?format,
        source_width = source_width,
        source_height = source_height,
        orientation = ?orientation,
        width = img.width(),
        height = img.height(),
        output_size_bytes = encoded.len(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Image thumbnail encoded"
    );

    Ok(encoded)
}

pub(crate) fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, TranscodeError> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let encoded = webp::Encoder::from_rgba(&rgba, width, height)
        .encode_simple(false, quality as f32)
        .map_err(|e| TranscodeError::TranscodeFailed(format!("WebP encoding failed: {:?}", e)))?;
    Ok(encoded.to_vec())
}
