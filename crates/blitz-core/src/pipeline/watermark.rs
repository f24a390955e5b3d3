//! Watermark stage: bitmap-font text or a logo image, placed at a grid anchor.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::composite::{blend_over, blend_pixel};
use super::overlay::{load_overlay, OverlayError};
use super::position::AnchoredBox;
use crate::settings::{WatermarkMode, WatermarkSettings};
use crate::types::{Stage, StageWarning};

/// Inset used for logo watermarks.
pub const IMAGE_PADDING: u32 = 20;

/// Smallest rendered text size in pixels.
pub const MIN_FONT_PX: f32 = 16.0;

const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 128]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Draw the watermark onto `canvas`. Recoverable problems become warnings.
pub fn apply(
    canvas: &mut RgbaImage,
    settings: &WatermarkSettings,
    warnings: &mut Vec<StageWarning>,
) {
    if !settings.enabled {
        return;
    }
    let result = match settings.mode {
        WatermarkMode::Text => {
            draw_text(canvas, settings, warnings);
            Ok(())
        }
        WatermarkMode::Image => draw_image(canvas, settings),
    };
    if let Err(e) = result {
        tracing::warn!("Skipping watermark: {}", e);
        warnings.push(StageWarning::new(Stage::Watermark, e.to_string()));
    }
}

/// Text size for a canvas: grows with output width, never below [`MIN_FONT_PX`].
pub fn font_px(font_size: f32, canvas_width: u32) -> f32 {
    (font_size * (canvas_width as f32 / 1920.0) * 2.0).max(MIN_FONT_PX)
}

fn draw_text(
    canvas: &mut RgbaImage,
    settings: &WatermarkSettings,
    warnings: &mut Vec<StageWarning>,
) {
    if settings.text.trim().is_empty() {
        tracing::debug!("Watermark text is empty, nothing to draw");
        return;
    }

    let color = parse_hex_color(&settings.color).unwrap_or_else(|| {
        tracing::warn!("Invalid watermark color '{}', using white", settings.color);
        warnings.push(StageWarning::new(
            Stage::Watermark,
            format!("invalid color '{}', using white", settings.color),
        ));
        WHITE
    });

    let max_side = canvas.width().max(canvas.height());
    let px = font_px(settings.font_size, canvas.width()).min(max_side as f32);
    let Some(text) = TextBlock::render(&settings.text, px, color, max_side) else {
        tracing::warn!(
            "Watermark text does not fit a {}x{} canvas, skipping",
            canvas.width(),
            canvas.height()
        );
        warnings.push(StageWarning::new(
            Stage::Watermark,
            format!(
                "text does not fit a {}x{} canvas",
                canvas.width(),
                canvas.height()
            ),
        ));
        return;
    };
    let at = AnchoredBox {
        anchor: settings.anchor,
        content_width: text.width,
        content_height: text.height,
        canvas_width: canvas.width(),
        canvas_height: canvas.height(),
        padding: px.round() as u32,
    }
    .resolve();

    blend_over(canvas, &text.layer, at, settings.opacity);
}

fn draw_image(canvas: &mut RgbaImage, settings: &WatermarkSettings) -> Result<(), OverlayError> {
    let logo = load_overlay(settings.image_data.as_deref())?;

    let width = ((canvas.width() as f32 * settings.scale).round() as u32).max(1);
    let aspect = logo.height() as f64 / logo.width() as f64;
    let height = ((width as f64 * aspect).round() as u32).max(1);
    let logo = imageops::resize(&logo, width, height, FilterType::Lanczos3);

    let at = AnchoredBox {
        anchor: settings.anchor,
        content_width: width,
        content_height: height,
        canvas_width: canvas.width(),
        canvas_height: canvas.height(),
        padding: IMAGE_PADDING,
    }
    .resolve();

    blend_over(canvas, &logo, at, settings.opacity);
    Ok(())
}

/// Rendered text with its layout box.
///
/// The layer is one glyph cell wider and taller than the box so the drop
/// shadow is not cut off; placement uses the box only.
pub struct TextBlock {
    pub layer: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl TextBlock {
    /// Rasterize `text`. The glyph cell shrinks so that neither side of the
    /// layer exceeds `max_side`; `None` when even 1 px cells do not fit.
    pub fn render(text: &str, font_px: f32, color: Rgba<u8>, max_side: u32) -> Option<Self> {
        let glyphs: Vec<[u8; 8]> = text.chars().map(glyph).collect();
        let columns = u32::try_from(glyphs.len()).ok()?.checked_mul(8)?;

        // Box plus one shadow cell, on both axes.
        let fit = max_side / columns.checked_add(1)?.max(9);
        let cell = ((font_px / 8.0).round() as u32).max(1).min(fit);
        if cell == 0 {
            return None;
        }

        let width = columns * cell;
        let height = (font_px.round() as u32)
            .min(max_side - cell)
            .max(8 * cell);
        let top = (height - 8 * cell) / 2;

        let mut layer = RgbaImage::new(width + cell, height + cell);
        for (offset, paint) in [(cell, SHADOW), (0, color)] {
            for (i, bits) in glyphs.iter().enumerate() {
                let left = i as u32 * 8 * cell + offset;
                for (row, line) in bits.iter().enumerate() {
                    for col in 0..8u32 {
                        if (line >> col) & 1 == 0 {
                            continue;
                        }
                        let x = left + col * cell;
                        let y = top + offset + row as u32 * cell;
                        for dy in 0..cell {
                            for dx in 0..cell {
                                blend_pixel(layer.get_pixel_mut(x + dx, y + dy), paint, 1.0);
                            }
                        }
                    }
                }
            }
        }

        Some(Self {
            layer,
            width,
            height,
        })
    }
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
pub fn parse_hex_color(input: &str) -> Option<Rgba<u8>> {
    let hex = input.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 | 8 => {
            let alpha = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Some(Rgba([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                alpha,
            ]))
        }
        _ => None,
    }
}
