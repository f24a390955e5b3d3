//! Straight-alpha "over" compositing with clipping.

use image::{Rgba, RgbaImage};

use super::position::Point;

/// Composite `src` over `dst`, scaling the source alpha by `opacity`.
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f32) {
    let sa = src[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    for c in 0..3 {
        let s = src[c] as f32;
        let d = dst[c] as f32;
        let v = (s * sa + d * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Composite `overlay` onto `canvas` with its top-left at `at`.
///
/// Pixels that land outside the canvas are dropped.
pub fn blend_over(canvas: &mut RgbaImage, overlay: &RgbaImage, at: Point, opacity: f32) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);

    // Visible overlay rows/cols after clipping.
    let x0 = (-at.x).clamp(0, overlay.width() as i64);
    let y0 = (-at.y).clamp(0, overlay.height() as i64);
    let x1 = (cw - at.x).clamp(0, overlay.width() as i64);
    let y1 = (ch - at.y).clamp(0, overlay.height() as i64);

    for oy in y0..y1 {
        for ox in x0..x1 {
            let src = *overlay.get_pixel(ox as u32, oy as u32);
            let dst = canvas.get_pixel_mut((at.x + ox) as u32, (at.y + oy) as u32);
            blend_pixel(dst, src, opacity);
        }
    }
}
