//! Test media and upload forms.

use axum_test::multipart::{MultipartForm, Part};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img_parts::jpeg::Jpeg;
use img_parts::ImageEXIF;
use serde_json::json;
use std::io::Cursor;

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 160, 90]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if x < width / 2 && y < height / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .unwrap();
    buffer
}

/// Big-endian TIFF block holding a single Orientation entry.
fn orientation_tiff(tag: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2a");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&tag.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff
}

/// JPEG with a red top-left quadrant, tagged with EXIF orientation `tag`.
pub fn oriented_jpeg(width: u32, height: u32, tag: u16) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(jpeg(width, height).into()).unwrap();
    jpeg.set_exif(Some(orientation_tiff(tag).into()));
    jpeg.encoder().bytes().to_vec()
}

pub fn meta(content_type: &str, file_name: &str, date: &str) -> serde_json::Value {
    json!({
        "type": content_type,
        "fileName": file_name,
        "date": date,
        "isPublic": false,
        "caption": "",
    })
}

/// Multipart form with `files` parts in order and the matching `meta` array.
pub fn upload_form(files: Vec<(&str, &str, Vec<u8>)>, meta: Vec<serde_json::Value>) -> MultipartForm {
    let mut form = MultipartForm::new().add_text("meta", serde_json::Value::Array(meta).to_string());
    for (file_name, content_type, data) in files {
        form = form.add_part(
            "files",
            Part::bytes(data).file_name(file_name).mime_type(content_type),
        );
    }
    form
}
