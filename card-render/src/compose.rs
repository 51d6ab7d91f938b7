//! Scene composition
//!
//! Turns a settled scene into RGBA pixels at `size * scale`: background
//! cover-fit, text runs through the glyph engine, cover-fitted photo under
//! a rounded-corner mask, badge lines, then the card's rounded frame.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::{RenderError, RenderResult};
use crate::glyph::{GlyphEngine, TextRun};
use crate::scene::{CardScene, ImageSlot, Rect};

const CARD_BG: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const HEADER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BADGE_COLOR: Rgba<u8> = Rgba([0xa5, 0x32, 0x1e, 255]);

/// Compose a settled scene into an RGBA surface.
pub fn compose(scene: &CardScene, engine: &dyn GlyphEngine) -> RenderResult<RgbaImage> {
    let (out_w, out_h) = scene.output_size();
    if out_w == 0 || out_h == 0 {
        return Err(RenderError::InvalidScene("zero-sized surface".into()));
    }
    let s = scene.scale as f32;
    let m = scene.metrics;

    let mut canvas = RgbaImage::from_pixel(out_w, out_h, CARD_BG);

    if let Some(bg) = cover_fitted(&scene.background, out_w, out_h) {
        imageops::overlay(&mut canvas, &bg, 0, 0);
    }

    // Header block.
    engine.draw(
        &mut canvas,
        &TextRun {
            text: &scene.title,
            x: (m.margin_x * s) as i32,
            y: (m.header_top * s) as i32,
            size: m.header_size * s,
            bold: true,
            color: HEADER_COLOR,
        },
    );
    engine.draw(
        &mut canvas,
        &TextRun {
            text: &scene.subtitle,
            x: (m.margin_x * s) as i32,
            y: ((m.header_top + m.header_size + 4.0 * m.unit) * s) as i32,
            size: m.subtitle_size * s,
            bold: false,
            color: HEADER_COLOR,
        },
    );

    // Label/value rows.
    for row in &scene.rows {
        let y = (row.origin.y * s) as i32;
        engine.draw(
            &mut canvas,
            &TextRun {
                text: &row.label,
                x: (row.origin.x * s) as i32,
                y,
                size: m.row_size * s,
                bold: true,
                color: TEXT_COLOR,
            },
        );
        engine.draw(
            &mut canvas,
            &TextRun {
                text: ":",
                x: ((row.origin.x + m.label_width) * s) as i32,
                y,
                size: m.row_size * s,
                bold: true,
                color: TEXT_COLOR,
            },
        );
        // Values clip against the photo box instead of running under it.
        let value_x = (row.origin.x + m.label_width + 12.0 * m.unit) * s;
        let value_max_w = (scene.photo.rect.x - 8.0 * m.unit) * s - value_x;
        let value = fit_text(engine, &row.value, m.row_size * s, value_max_w);
        engine.draw(
            &mut canvas,
            &TextRun {
                text: &value,
                x: value_x as i32,
                y,
                size: m.row_size * s,
                bold: row.emphasis,
                color: TEXT_COLOR,
            },
        );
    }

    // Photo, cover-fitted and rounded.
    let photo_rect = scale_rect(scene.photo.rect, s);
    if let Some(mut photo) =
        cover_fitted(&scene.photo.slot, photo_rect.w as u32, photo_rect.h as u32)
    {
        round_corners(&mut photo, scene.photo.corner_radius * s);
        imageops::overlay(&mut canvas, &photo, photo_rect.x as i64, photo_rect.y as i64);
    }

    // Medical badge lines.
    if let Some(badge) = &scene.badge {
        for (i, line) in badge.lines.iter().enumerate() {
            engine.draw(
                &mut canvas,
                &TextRun {
                    text: line,
                    x: (badge.rect.x * s) as i32,
                    y: ((badge.rect.y + i as f32 * m.badge_line_gap) * s) as i32,
                    size: m.badge_size * s,
                    bold: true,
                    color: BADGE_COLOR,
                },
            );
        }
    }

    apply_rounded_frame(
        &mut canvas,
        scene.corner_radius * s,
        s.max(1.0),
        Rgba(scene.border_rgba),
    );

    Ok(canvas)
}

/// Longest prefix of `text` that fits in `max_width` at `size`.
fn fit_text(engine: &dyn GlyphEngine, text: &str, size: f32, max_width: f32) -> String {
    if max_width <= 0.0 {
        return String::new();
    }
    if engine.measure(text, size) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        if engine.measure(&out, size) > max_width {
            out.pop();
            break;
        }
    }
    out
}

/// Crop a slot's pixels per its resolved cover crop and resize to the
/// destination box. `None` when the slot never produced pixels.
fn cover_fitted(slot: &ImageSlot, dst_w: u32, dst_h: u32) -> Option<RgbaImage> {
    let pixels = slot.pixels.as_ref()?;
    if dst_w == 0 || dst_h == 0 {
        return None;
    }
    let cropped = match slot.crop {
        Some(crop) if crop.w >= 1.0 && crop.h >= 1.0 => imageops::crop_imm(
            pixels,
            crop.x as u32,
            crop.y as u32,
            crop.w as u32,
            crop.h as u32,
        )
        .to_image(),
        _ => pixels.clone(),
    };
    Some(imageops::resize(&cropped, dst_w, dst_h, FilterType::Triangle))
}

fn scale_rect(rect: Rect, s: f32) -> Rect {
    Rect::new(rect.x * s, rect.y * s, rect.w * s, rect.h * s)
}

/// Clear alpha outside a rounded-rect boundary.
fn round_corners(img: &mut RgbaImage, radius: f32) {
    let (w, h) = (img.width(), img.height());
    for y in 0..h {
        for x in 0..w {
            if rounded_rect_distance(x, y, w, h, radius) > 0.0 {
                img.get_pixel_mut(x, y).0[3] = 0;
            }
        }
    }
}

/// Rounded-corner mask plus a border ring for the whole card surface.
fn apply_rounded_frame(canvas: &mut RgbaImage, radius: f32, border_width: f32, border: Rgba<u8>) {
    let (w, h) = (canvas.width(), canvas.height());
    for y in 0..h {
        for x in 0..w {
            let d = rounded_rect_distance(x, y, w, h, radius);
            if d > 0.0 {
                canvas.get_pixel_mut(x, y).0 = [0, 0, 0, 0];
            } else if d > -border_width {
                canvas.get_pixel_mut(x, y).0 = border.0;
            }
        }
    }
}

/// Signed distance from a pixel center to the rounded-rect boundary of a
/// `w` x `h` surface (negative inside).
fn rounded_rect_distance(x: u32, y: u32, w: u32, h: u32, radius: f32) -> f32 {
    let half_w = w as f32 / 2.0;
    let half_h = h as f32 / 2.0;
    let r = radius.min(half_w).min(half_h).max(0.0);
    let px = x as f32 + 0.5 - half_w;
    let py = y as f32 + 0.5 - half_h;
    let qx = px.abs() - (half_w - r);
    let qy = py.abs() - (half_h - r);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - r
}
