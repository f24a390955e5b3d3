//! Encode stage: rasterize the composited canvas to JPEG, PNG or WebP.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::{PipelineError, PipelineResult};
use crate::settings::{OutputFormat, OutputSettings};

/// Encode `canvas`, consuming it so the bitmap is freed as soon as we are done.
pub fn encode(canvas: RgbaImage, output: &OutputSettings) -> PipelineResult<Vec<u8>> {
    let quality = quality_percent(output.effective_quality());
    let (width, height) = canvas.dimensions();
    let mut buffer = Vec::new();

    let result = match output.format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel; it is dropped.
            let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality).encode(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Png => PngEncoder::new_with_quality(
            Cursor::new(&mut buffer),
            CompressionType::Default,
            FilterType::Adaptive,
        )
        .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8),
        OutputFormat::Webp => {
            let mut canvas = canvas;
            quantize_rgb(canvas.as_mut(), quality);
            WebPEncoder::new_lossless(Cursor::new(&mut buffer)).encode(
                canvas.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )
        }
    };

    result.map_err(|e| PipelineError::Encode {
        format: output.format.to_string(),
        message: e.to_string(),
    })?;
    Ok(buffer)
}

/// Map a [0, 1] quality to the 1..=100 scale encoders use.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Reduce RGB precision so the lossless WebP encoder still trades detail for
/// size. Alpha is untouched.
fn quantize_rgb(data: &mut [u8], quality: u8) {
    if quality >= 100 {
        return;
    }
    let step = 255.0 / (webp_levels(quality) as f32 - 1.0);
    for pixel in data.chunks_exact_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            let bucket = (f32::from(*channel) / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Palette size per channel for a quality: coarse at the low end, fine near 100.
fn webp_levels(quality: u8) -> u16 {
    if quality >= 100 {
        return 256;
    }
    let q = (quality as f32).clamp(1.0, 100.0) / 100.0;
    (2.0 + q * q * 254.0).round().clamp(2.0, 256.0) as u16
}
