//! Image decoding with format detection and dimension limits.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::SourceFile;

/// Image decoder with configurable limits.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded bitmap
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode source bytes into a bitmap.
    ///
    /// Runs on the job's worker thread, so it is synchronous.
    pub fn decode(&self, file: &SourceFile) -> Result<DecodedImage, PipelineError> {
        let reader = Self::reader(file)?;
        let format = reader.format().ok_or_else(|| PipelineError::UnsupportedFormat {
            name: file.name.clone(),
            format: file.mime_type.clone(),
        })?;

        // Check the header dimensions before allocating the bitmap.
        self.probe(file)?;

        let image = reader.decode().map_err(|e| PipelineError::Decode {
            name: file.name.clone(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }

    /// Read only the header dimensions.
    pub fn probe(&self, file: &SourceFile) -> Result<(u32, u32), PipelineError> {
        let (width, height) =
            Self::reader(file)?
                .into_dimensions()
                .map_err(|e| PipelineError::Decode {
                    name: file.name.clone(),
                    message: e.to_string(),
                })?;
        self.check_dimensions(file, width, height)?;
        Ok((width, height))
    }

    fn reader(file: &SourceFile) -> Result<image::ImageReader<Cursor<&[u8]>>, PipelineError> {
        image::ImageReader::new(Cursor::new(file.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                name: file.name.clone(),
                message: format!("Cannot detect image format: {}", e),
            })
    }

    /// Reject dimensions over `max_image_dimension`. Also applied to resize targets.
    pub(crate) fn check_dimensions(
        &self,
        file: &SourceFile,
        width: u32,
        height: u32,
    ) -> Result<(), PipelineError> {
        let max = self.limits.max_image_dimension;
        if width > max || height > max {
            return Err(PipelineError::ImageTooLarge {
                name: file.name.clone(),
                width,
                height,
                max_dim: max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn decoder() -> ImageDecoder {
        ImageDecoder::new(LimitsConfig::default())
    }

    #[test]
    fn test_decode_each_format() {
        for (bytes, format) in [
            (test_support::jpeg_bytes(30, 20, 90), ImageFormat::Jpeg),
            (test_support::png_bytes(30, 20), ImageFormat::Png),
            (test_support::webp_bytes(30, 20), ImageFormat::WebP),
        ] {
            let file = test_support::source("img", "image/whatever", bytes);
            let decoded = decoder().decode(&file).unwrap();
            assert_eq!(decoded.format, format);
            assert_eq!((decoded.width, decoded.height), (30, 20));
        }
    }

    #[test]
    fn test_format_detected_by_content() {
        // PNG bytes under a .jpg name still decode as PNG.
        let file = test_support::source("photo.jpg", "image/jpeg", test_support::png_bytes(8, 8));
        assert_eq!(decoder().decode(&file).unwrap().format, ImageFormat::Png);
    }

    #[test]
    fn test_corrupt_bytes_fail_decode() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.extend_from_slice(&[0x13; 64]);
        let file = test_support::source("broken.jpg", "image/jpeg", bytes);
        assert!(matches!(
            decoder().decode(&file),
            Err(PipelineError::Decode { .. })
        ));
    }

    #[test]
    fn test_dimension_limit() {
        let decoder = ImageDecoder::new(LimitsConfig {
            max_image_dimension: 10,
            ..LimitsConfig::default()
        });
        let file = test_support::source("big.png", "image/png", test_support::png_bytes(11, 5));
        assert!(matches!(
            decoder.probe(&file),
            Err(PipelineError::ImageTooLarge { width: 11, .. })
        ));
    }
}
