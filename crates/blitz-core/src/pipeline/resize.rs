//! Resize stage.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::settings::{ResizeMode, ResizeSettings};

/// Output dimensions for a resize request. Never returns a zero side.
///
/// `AbsoluteWidth` always keeps the source aspect ratio, whatever
/// `maintain_aspect` says.
pub fn target_dimensions(width: u32, height: u32, settings: &ResizeSettings) -> (u32, u32) {
    if !settings.enabled {
        return (width, height);
    }
    let (w, h) = (width as f64, height as f64);
    let (tw, th) = match settings.mode {
        ResizeMode::Percentage => {
            let factor = settings.value / 100.0;
            (w * factor, h * factor)
        }
        ResizeMode::AbsoluteWidth => {
            let tw = settings.value;
            (tw, if w > 0.0 { h * tw / w } else { h })
        }
    };
    (round_side(tw), round_side(th))
}

fn round_side(v: f64) -> u32 {
    if v.is_finite() {
        v.round().clamp(1.0, u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Apply the resize stage. The source bitmap is consumed.
pub fn resize(image: DynamicImage, settings: &ResizeSettings) -> DynamicImage {
    let (tw, th) = target_dimensions(image.width(), image.height(), settings);
    if (tw, th) == (image.width(), image.height()) {
        return image;
    }
    tracing::trace!(
        "Resizing {}x{} -> {}x{}",
        image.width(),
        image.height(),
        tw,
        th
    );
    image.resize_exact(tw, th, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn settings(mode: ResizeMode, value: f64, maintain_aspect: bool) -> ResizeSettings {
        ResizeSettings {
            enabled: true,
            mode,
            value,
            maintain_aspect,
        }
    }

    #[test]
    fn test_percentage_rounds_each_axis() {
        let s = settings(ResizeMode::Percentage, 50.0, true);
        assert_eq!(target_dimensions(1000, 800, &s), (500, 400));

        let s = settings(ResizeMode::Percentage, 33.0, true);
        // 333 * 0.33 = 109.89, 101 * 0.33 = 33.33
        assert_eq!(target_dimensions(333, 101, &s), (110, 33));
    }

    #[test]
    fn test_absolute_width_keeps_aspect_regardless_of_flag() {
        for maintain in [true, false] {
            let s = settings(ResizeMode::AbsoluteWidth, 640.0, maintain);
            let (w, h) = target_dimensions(1920, 1080, &s);
            assert_eq!((w, h), (640, 360));
        }

        let s = settings(ResizeMode::AbsoluteWidth, 100.0, false);
        let (w, h) = target_dimensions(333, 777, &s);
        let expected = 777.0 * w as f64 / 333.0;
        assert!((h as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_never_zero() {
        let s = settings(ResizeMode::Percentage, 0.01, true);
        assert_eq!(target_dimensions(10, 10, &s), (1, 1));
        let s = settings(ResizeMode::AbsoluteWidth, 0.0, true);
        assert_eq!(target_dimensions(10, 10, &s), (1, 1));
    }

    #[test]
    fn test_disabled_is_identity() {
        let s = ResizeSettings::default();
        assert_eq!(target_dimensions(123, 45, &s), (123, 45));
    }

    #[test]
    fn test_resize_produces_target() {
        let img = test_support::gradient_rgb(100, 60);
        let out = resize(img, &settings(ResizeMode::Percentage, 25.0, true));
        assert_eq!((out.width(), out.height()), (25, 15));
    }
}
