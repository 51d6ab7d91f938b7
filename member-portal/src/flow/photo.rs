//! Photo compression
//!
//! Selected photos are compressed client-side before upload: bounded to
//! 1024 px on the longest edge and re-encoded as JPEG.

use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;

use crate::error::{FlowError, FlowResult};

/// Longest allowed edge of an uploaded photo.
const MAX_PHOTO_EDGE: u32 = 1024;

/// JPEG quality for member photos.
const JPEG_QUALITY: u8 = 70;

/// Decode, bound and re-encode a selected photo.
pub fn compress_photo(bytes: &[u8]) -> FlowResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| FlowError::Validation(format!("Invalid photo image: {e}")))?;

    let img = if img.width() > MAX_PHOTO_EDGE || img.height() > MAX_PHOTO_EDGE {
        img.resize(MAX_PHOTO_EDGE, MAX_PHOTO_EDGE, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| FlowError::Validation(format!("Photo compression failed: {e}")))?;

    Ok(buffer)
}
