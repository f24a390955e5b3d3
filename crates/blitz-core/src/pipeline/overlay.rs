//! Overlay asset loading for the watermark and signature stages.
//!
//! Assets arrive as a `data:<mime>;base64,<payload>` URL or a file path.
//! Failures here never fail a job; the calling stage records a warning and
//! is skipped.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbaImage;
use thiserror::Error;

/// Why an overlay asset could not be used.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("no image data provided")]
    Missing,

    #[error("malformed data URL: {0}")]
    InvalidDataUrl(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode overlay image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("overlay image is empty")]
    Empty,
}

/// Load an overlay as RGBA.
pub fn load_overlay(source: Option<&str>) -> Result<RgbaImage, OverlayError> {
    let source = source.map(str::trim).filter(|s| !s.is_empty());
    let source = source.ok_or(OverlayError::Missing)?;

    let bytes = if source.starts_with("data:") {
        decode_data_url(source)?
    } else {
        let path = shellexpand::tilde(source);
        std::fs::read(&*path).map_err(|e| OverlayError::Io {
            path: path.to_string(),
            source: e,
        })?
    };

    let image = image::load_from_memory(&bytes)?.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(OverlayError::Empty);
    }
    Ok(image)
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, OverlayError> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| OverlayError::InvalidDataUrl("missing ','".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(OverlayError::InvalidDataUrl(
            "only base64 payloads are supported".to_string(),
        ));
    }
    Ok(STANDARD.decode(payload.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn test_load_from_data_url() {
        let url = test_support::data_url(&test_support::png_bytes(12, 6), "image/png");
        let img = load_overlay(Some(&url)).unwrap();
        assert_eq!(img.dimensions(), (12, 6));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, test_support::png_bytes(5, 5)).unwrap();

        let img = load_overlay(path.to_str()).unwrap();
        assert_eq!(img.dimensions(), (5, 5));
    }

    #[test]
    fn test_load_failures() {
        assert!(matches!(load_overlay(None), Err(OverlayError::Missing)));
        assert!(matches!(load_overlay(Some("  ")), Err(OverlayError::Missing)));
        assert!(matches!(
            load_overlay(Some("data:image/png,abc")),
            Err(OverlayError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            load_overlay(Some("data:image/png;base64,@@@")),
            Err(OverlayError::Base64(_))
        ));
        assert!(matches!(
            load_overlay(Some("/definitely/not/here.png")),
            Err(OverlayError::Io { .. })
        ));

        let url = test_support::data_url(b"not an image", "image/png");
        assert!(matches!(
            load_overlay(Some(&url)),
            Err(OverlayError::Decode(_))
        ));
    }
}
