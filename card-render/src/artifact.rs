//! Download artifacts
//!
//! PNG encoding and download-file writing. The binary buffer is the
//! preferred artifact; a base64 data URL is the fallback representation for
//! surfaces that cannot take a file. Writes are atomic (tmp + rename) and
//! the tmp file never survives a failure.

use base64::Engine;
use image::RgbaImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{RenderError, RenderResult};

/// Encode a composed surface as PNG bytes.
pub fn encode_png(pixels: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut bytes = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Base64 data-URL fallback for PNG bytes.
pub fn data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Download filename: `<PREFIX>_<stem>.png`.
pub fn download_filename(prefix: &str, stem: &str) -> String {
    format!("{prefix}_{stem}.png")
}

/// Write a download artifact atomically into `dir`.
///
/// The bytes land in a `.tmp` sibling first and are renamed into place; on
/// any failure the tmp file is removed before the error propagates.
pub fn save_download(dir: &Path, filename: &str, bytes: &[u8]) -> RenderResult<PathBuf> {
    if filename.is_empty() {
        return Err(RenderError::InvalidScene("empty download filename".into()));
    }
    std::fs::create_dir_all(dir)?;

    let final_path = dir.join(filename);
    let tmp_path = dir.join(format!("{filename}.tmp"));

    if let Err(e) = std::fs::write(&tmp_path, bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&tmp_path, &final_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    info!(path = %final_path.display(), size = bytes.len(), "card saved");
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_roundtrip() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let bytes = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn test_data_url_shape() {
        let url = data_url(&[1, 2, 3]);
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename("ID_CARD", "1042"), "ID_CARD_1042.png");
    }

    #[test]
    fn test_save_download_writes_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_download(dir.path(), "ID_CARD_1.png", b"png-bytes").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
        assert!(!dir.path().join("ID_CARD_1.png.tmp").exists());
    }

    #[test]
    fn test_save_download_failure_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the directory should be makes the write path fail.
        let blocked = dir.path().join("not-a-dir");
        std::fs::write(&blocked, b"x").unwrap();

        let result = save_download(&blocked, "ID_CARD_1.png", b"png-bytes");
        assert!(result.is_err());
        assert!(!blocked.join("ID_CARD_1.png.tmp").exists());
    }
}
