//! Glyph engines
//!
//! Text drawing sits behind a trait, like the printer seam in a print
//! pipeline: the compositor decides where a run goes, the engine decides
//! how glyphs become pixels. The production engine rasterizes a TTF/OTF
//! loaded at runtime; the null engine skips glyph output entirely.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// One positioned text run, in output pixels.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub x: i32,
    pub y: i32,
    pub size: f32,
    pub bold: bool,
    pub color: Rgba<u8>,
}

/// Draws text runs onto an RGBA canvas.
pub trait GlyphEngine {
    fn draw(&self, canvas: &mut RgbaImage, run: &TextRun<'_>);

    /// Advance width of `text` at `size`, in pixels.
    fn measure(&self, text: &str, size: f32) -> f32;
}

/// Font-backed glyph engine.
#[derive(Debug)]
pub struct FontGlyphEngine {
    font: FontArc,
}

impl FontGlyphEngine {
    /// Load a TTF/OTF font from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> RenderResult<Self> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| RenderError::Font(format!("invalid font data: {e}")))?;
        Ok(Self { font })
    }

    /// Load a TTF/OTF font from a file path.
    pub fn from_file(path: &Path) -> RenderResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        Self::from_bytes(bytes)
    }
}

impl GlyphEngine for FontGlyphEngine {
    fn draw(&self, canvas: &mut RgbaImage, run: &TextRun<'_>) {
        let scale = PxScale::from(run.size);
        imageproc::drawing::draw_text_mut(
            canvas, run.color, run.x, run.y, scale, &self.font, run.text,
        );
        if run.bold {
            // Double strike, one pixel over.
            imageproc::drawing::draw_text_mut(
                canvas,
                run.color,
                run.x + 1,
                run.y,
                scale,
                &self.font,
                run.text,
            );
        }
    }

    fn measure(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        text.chars()
            .map(|c| scaled.h_advance(scaled.glyph_id(c)))
            .sum()
    }
}

/// Glyph engine that draws nothing.
///
/// For headless environments without a font asset; geometry and image
/// composition still run, only glyph pixels are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGlyphEngine;

impl GlyphEngine for NullGlyphEngine {
    fn draw(&self, _canvas: &mut RgbaImage, _run: &TextRun<'_>) {}

    fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.55
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_bytes_rejected() {
        let err = FontGlyphEngine::from_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn test_null_engine_measures_monotonically() {
        let engine = NullGlyphEngine;
        assert!(engine.measure("ABCD", 13.0) > engine.measure("AB", 13.0));
        assert_eq!(engine.measure("", 13.0), 0.0);
    }
}
