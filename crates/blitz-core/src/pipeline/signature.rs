//! Signature stage: an uploaded or hand-drawn image centered on a percentage point.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::composite::blend_over;
use super::overlay::{load_overlay, OverlayError};
use super::position::{center_on_percentage, Point};
use crate::settings::SignatureSettings;
use crate::types::{Stage, StageWarning};

/// Draw the signature onto `canvas`. A missing or broken asset becomes a warning.
pub fn apply(
    canvas: &mut RgbaImage,
    settings: &SignatureSettings,
    warnings: &mut Vec<StageWarning>,
) {
    if !settings.enabled {
        return;
    }
    if let Err(e) = draw(canvas, settings) {
        tracing::warn!("Skipping signature: {}", e);
        warnings.push(StageWarning::new(Stage::Signature, e.to_string()));
    }
}

fn draw(canvas: &mut RgbaImage, settings: &SignatureSettings) -> Result<Point, OverlayError> {
    let signature = load_overlay(settings.image_data.as_deref())?;

    let aspect = signature.height() as f64 / signature.width() as f64;
    let width = (canvas.width() as f64 * settings.scale as f64 / 100.0).round() as u32;
    let width = width.max(1);
    let height = ((width as f64 * aspect).round() as u32).max(1);
    let signature = imageops::resize(&signature, width, height, FilterType::Lanczos3);

    let at = center_on_percentage(
        width,
        height,
        canvas.width(),
        canvas.height(),
        settings.position.x_pct,
        settings.position.y_pct,
    );
    blend_over(canvas, &signature, at, 1.0);
    Ok(at)
}
