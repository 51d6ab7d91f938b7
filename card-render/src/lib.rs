//! # card-render
//!
//! Offscreen membership-card rendering - scene construction and PNG export.
//!
//! ## Scope
//!
//! This crate handles HOW a card becomes pixels:
//! - Typed card scenes (background, text rows, photo, medical badge)
//! - Asynchronous image loading with bounded, tolerant waits
//! - Layout settling before composition
//! - RGBA composition and PNG encoding
//! - Download-artifact writing (binary file, data-URL fallback)
//!
//! Business logic (WHAT goes on a card, when a member may download one)
//! stays in application code.
//!
//! ## Example
//!
//! ```ignore
//! use card_render::{CardData, CardRenderer, CardTheme, direct_card};
//!
//! let scene = direct_card(&data, &theme);
//! let rendered = renderer.render(scene).await?;
//! let bytes = rendered.encode_png()?;
//! ```

mod artifact;
mod card;
mod compose;
mod error;
mod fetch;
mod glyph;
mod scene;

// Re-exports
pub use artifact::{data_url, download_filename, save_download};
pub use card::{CardData, CardTheme, direct_card, direct_card_stem, full_card, full_card_stem};
pub use compose::compose;
pub use error::{RenderError, RenderResult};
pub use fetch::ImageLoader;
pub use glyph::{FontGlyphEngine, GlyphEngine, NullGlyphEngine, TextRun};
pub use scene::{Badge, CardScene, ImageSlot, ImageSource, PhotoBox, Rect, TextRow};

use image::RgbaImage;

/// Card renderer: loads scene images, settles layout, composes pixels.
///
/// The full sequence for one card is deterministic: every image finishes
/// (or times out) before layout settles, and layout settles before
/// composition starts.
pub struct CardRenderer {
    loader: ImageLoader,
    engine: Box<dyn GlyphEngine + Send + Sync>,
}

/// A composed card surface, ready for encoding.
pub struct RenderedCard {
    pub pixels: RgbaImage,
}

impl RenderedCard {
    /// Encode the surface as PNG bytes (the preferred binary artifact).
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        artifact::encode_png(&self.pixels)
    }
}

impl CardRenderer {
    pub fn new(loader: ImageLoader, engine: Box<dyn GlyphEngine + Send + Sync>) -> Self {
        Self { loader, engine }
    }

    /// Render a scene to pixels.
    ///
    /// Scene resources live only for the duration of this call; they are
    /// released on success and failure alike.
    pub async fn render(&self, mut scene: CardScene) -> RenderResult<RenderedCard> {
        self.loader.load_scene(&mut scene).await;
        scene.settle();
        let pixels = compose(&scene, self.engine.as_ref())?;
        Ok(RenderedCard { pixels })
    }
}
