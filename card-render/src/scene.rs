//! Card scene model
//!
//! A scene is an offscreen description of one card surface: fixed logical
//! size, a background image, upper-cased text rows, a photo box and an
//! optional medical badge. Scenes are built by the card builders, loaded by
//! [`crate::ImageLoader`], settled, then handed to the compositor. Nothing
//! here ever touches a visible surface.

use image::RgbaImage;
use std::path::PathBuf;

/// Where an image's bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Url(String),
    Path(PathBuf),
}

/// An image slot: a source plus the decoded pixels once loading finished.
///
/// A slot without pixels after loading is a tolerated degradation, never an
/// error; composition simply skips it.
#[derive(Debug, Default)]
pub struct ImageSlot {
    pub source: Option<ImageSource>,
    pub pixels: Option<RgbaImage>,
    /// Source crop used for cover fitting, resolved during arrange.
    pub crop: Option<Rect>,
}

impl ImageSlot {
    pub fn url(url: impl Into<String>) -> Self {
        Self { source: Some(ImageSource::Url(url.into())), pixels: None, crop: None }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self { source: Some(ImageSource::Path(path.into())), pixels: None, crop: None }
    }
}

/// Axis-aligned rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// One label/value row of card text. Values are upper-cased at build time.
#[derive(Debug, Clone, Default)]
pub struct TextRow {
    pub label: String,
    pub value: String,
    /// Heavier label weight (the membership-number row).
    pub emphasis: bool,
    /// Resolved label baseline origin.
    pub origin: Rect,
}

/// Medical badge: short accent-colored lines under the photo.
#[derive(Debug, Clone, Default)]
pub struct Badge {
    pub lines: Vec<String>,
    pub rect: Rect,
}

/// The member photo box: square, cover-fitted, rounded corners.
#[derive(Debug, Default)]
pub struct PhotoBox {
    pub slot: ImageSlot,
    pub corner_radius: f32,
    pub rect: Rect,
}

/// Type metrics derived from the surface size.
///
/// The direct card is designed at 400x210; every measure scales linearly
/// with surface height so the full-resolution card keeps the same
/// proportions.
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub unit: f32,
    pub margin_x: f32,
    pub header_top: f32,
    pub header_size: f32,
    pub subtitle_size: f32,
    pub rows_top: f32,
    pub row_gap: f32,
    pub row_size: f32,
    pub label_width: f32,
    pub photo_size: f32,
    pub photo_margin_right: f32,
    pub photo_margin_bottom: f32,
    pub badge_size: f32,
    pub badge_line_gap: f32,
}

impl Metrics {
    /// Base design height the metric constants are expressed against.
    pub const DESIGN_HEIGHT: f32 = 210.0;

    pub fn for_height(height: u32) -> Self {
        let u = height as f32 / Self::DESIGN_HEIGHT;
        Self {
            unit: u,
            margin_x: 14.0 * u,
            header_top: 10.0 * u,
            header_size: 14.0 * u,
            subtitle_size: 12.0 * u,
            rows_top: 56.0 * u,
            row_gap: 22.0 * u,
            row_size: 13.0 * u,
            label_width: 90.0 * u,
            photo_size: 70.0 * u,
            photo_margin_right: 8.0 * u,
            photo_margin_bottom: 16.0 * u,
            badge_size: 10.0 * u,
            badge_line_gap: 12.0 * u,
        }
    }
}

/// Offscreen card surface.
#[derive(Debug)]
pub struct CardScene {
    /// Logical surface width in pixels.
    pub width: u32,
    /// Logical surface height in pixels.
    pub height: u32,
    /// Composition scale factor (output is `width*scale` x `height*scale`).
    pub scale: u32,
    pub title: String,
    pub subtitle: String,
    pub background: ImageSlot,
    pub rows: Vec<TextRow>,
    pub photo: PhotoBox,
    pub badge: Option<Badge>,
    pub corner_radius: f32,
    pub border_rgba: [u8; 4],
    pub metrics: Metrics,
}

impl CardScene {
    pub fn new(width: u32, height: u32, scale: u32) -> Self {
        Self {
            width,
            height,
            scale,
            title: String::new(),
            subtitle: String::new(),
            background: ImageSlot::default(),
            rows: Vec::new(),
            photo: PhotoBox::default(),
            badge: None,
            corner_radius: 14.0 * height as f32 / Metrics::DESIGN_HEIGHT,
            border_rgba: [0x0a, 0x77, 0x00, 0xff],
            metrics: Metrics::for_height(height),
        }
    }

    /// Output pixel dimensions after composition.
    pub fn output_size(&self) -> (u32, u32) {
        (self.width * self.scale, self.height * self.scale)
    }

    /// Every image slot of the scene, for the loader.
    pub fn image_slots_mut(&mut self) -> Vec<&mut ImageSlot> {
        vec![&mut self.background, &mut self.photo.slot]
    }

    /// One measurement/arrange pass: resolve element rectangles and image
    /// crops from the current state of the scene.
    pub fn arrange(&mut self) {
        let m = self.metrics;
        let w = self.width as f32;
        let h = self.height as f32;

        for (i, row) in self.rows.iter_mut().enumerate() {
            row.origin = Rect::new(
                m.margin_x,
                m.rows_top + i as f32 * m.row_gap,
                w - 2.0 * m.margin_x,
                m.row_size,
            );
        }

        // Photo and badge are anchored as one group to the bottom-right
        // corner; the badge extends the group downward.
        let badge_h = self
            .badge
            .as_ref()
            .map(|b| 4.0 * m.unit + b.lines.len() as f32 * m.badge_line_gap)
            .unwrap_or(0.0);
        let group_h = m.photo_size + badge_h;
        let photo_x = w - m.photo_margin_right - m.photo_size;
        let photo_y = h - m.photo_margin_bottom - group_h;
        self.photo.rect = Rect::new(photo_x, photo_y, m.photo_size, m.photo_size);
        self.photo.corner_radius = 6.0 * m.unit;
        if let Some(badge) = self.badge.as_mut() {
            badge.rect = Rect::new(
                photo_x,
                photo_y + m.photo_size + 4.0 * m.unit,
                m.photo_size,
                badge.lines.len() as f32 * m.badge_line_gap,
            );
        }

        // Cover crops depend on natural image sizes, which only exist after
        // loading; before that the crop stays unresolved.
        if let Some(px) = &self.background.pixels {
            self.background.crop = Some(cover_crop(px.width(), px.height(), w, h));
        }
        if let Some(px) = &self.photo.slot.pixels {
            self.photo.slot.crop =
                Some(cover_crop(px.width(), px.height(), m.photo_size, m.photo_size));
        }
    }

    /// Settle the layout before composition.
    ///
    /// Two arrange passes, mirroring the two-frame wait the direct download
    /// path requires after image readiness: the second pass runs against
    /// fully resolved image sizes and confirms the geometry is stable.
    pub fn settle(&mut self) {
        self.arrange();
        self.arrange();
    }
}

/// Source crop rectangle for cover-fitting `src` into a `dst_w` x `dst_h`
/// box: center crop of the largest region with the destination's aspect.
pub fn cover_crop(src_w: u32, src_h: u32, dst_w: f32, dst_h: f32) -> Rect {
    let src_w = src_w as f32;
    let src_h = src_h as f32;
    if src_w <= 0.0 || src_h <= 0.0 || dst_w <= 0.0 || dst_h <= 0.0 {
        return Rect::default();
    }
    let dst_aspect = dst_w / dst_h;
    let src_aspect = src_w / src_h;
    if src_aspect > dst_aspect {
        // Source is wider: crop the sides.
        let crop_w = src_h * dst_aspect;
        Rect::new((src_w - crop_w) / 2.0, 0.0, crop_w, src_h)
    } else {
        // Source is taller: crop top and bottom.
        let crop_h = src_w / dst_aspect;
        Rect::new(0.0, (src_h - crop_h) / 2.0, src_w, crop_h)
    }
}
