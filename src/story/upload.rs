//! Image preparation for `/generate_story` uploads.
//!
//! Every upload is decoded, scaled down to fit inside
//! [`MAX_UPLOAD_DIMENSION`] on both sides (never scaled up), flattened to RGB
//! and re-encoded as JPEG at [`JPEG_QUALITY`] before it is base64-encoded.
//! This keeps request bodies small no matter what the camera produced.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, GenericImageView};

use super::request::StoryError;

/// Longest side, in pixels, of an uploaded image.
pub const MAX_UPLOAD_DIMENSION: u32 = 1024;

/// JPEG quality used for re-encoding (0-100).
pub const JPEG_QUALITY: u8 = 85;

/// Decode `bytes`, fit them inside the upload bounds and return JPEG bytes.
pub fn prepare_image(bytes: &[u8]) -> Result<Vec<u8>, StoryError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();

    let img = if width > MAX_UPLOAD_DIMENSION || height > MAX_UPLOAD_DIMENSION {
        log::debug!("story: scaling {width}x{height} upload to fit {MAX_UPLOAD_DIMENSION}px");
        img.resize(MAX_UPLOAD_DIMENSION, MAX_UPLOAD_DIMENSION, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    Ok(out)
}

/// Read an image file, prepare it with [`prepare_image`] and return the
/// result as standard base64 (no data-URI prefix).
pub fn encode_image_file(path: &Path) -> Result<String, StoryError> {
    let bytes = std::fs::read(path)?;
    let jpeg = prepare_image(&bytes)?;
    Ok(STANDARD.encode(jpeg))
}
