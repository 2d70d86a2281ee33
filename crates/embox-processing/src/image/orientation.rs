//! EXIF orientation handling

use exif::{In, Reader, Tag};
use image::DynamicImage;
use std::io::Cursor;

/// Rotation needed to display an image upright, derived from its EXIF orientation tag.
///
/// Only the pure rotations are corrected. Mirrored orientations (2, 4, 5, 7) and
/// out-of-range values are treated as [`ExifOrientation::Normal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifOrientation {
    Normal,
    /// Tag 3
    Rotate180,
    /// Tag 6: 90° clockwise, the same as 270° counter-clockwise
    Rotate90Cw,
    /// Tag 8: 270° clockwise, the same as 90° counter-clockwise
    Rotate270Cw,
}

impl ExifOrientation {
    pub fn from_tag(value: u32) -> Self {
        match value {
            3 => ExifOrientation::Rotate180,
            6 => ExifOrientation::Rotate90Cw,
            8 => ExifOrientation::Rotate270Cw,
            _ => ExifOrientation::Normal,
        }
    }

    pub fn is_rotation(self) -> bool {
        self != ExifOrientation::Normal
    }

    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            ExifOrientation::Normal => img,
            ExifOrientation::Rotate180 => img.rotate180(),
            ExifOrientation::Rotate90Cw => img.rotate90(),
            ExifOrientation::Rotate270Cw => img.rotate270(),
        }
    }
}

/// Read the primary-image orientation tag, if the container carries EXIF at all.
pub fn read_exif_orientation(data: &[u8]) -> Option<u32> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    exif.get_field(Tag::Orientation, In::PRIMARY)?
        .value
        .get_uint(0)
}
