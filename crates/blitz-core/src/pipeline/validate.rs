//! Input validation before decoding.

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::settings::OutputFormat;
use crate::types::SourceFile;

/// Validates source bytes before processing.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Cheap checks ahead of a full decode.
    ///
    /// Checks:
    /// - Byte size is within limits
    /// - Magic bytes identify JPEG, PNG or WebP
    ///
    /// Returns the sniffed format, which wins over the declared mime type.
    pub fn validate(&self, file: &SourceFile) -> Result<OutputFormat, PipelineError> {
        let size = file.bytes.len() as u64;
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if size > max_bytes {
            return Err(PipelineError::FileTooLarge {
                name: file.name.clone(),
                size_mb: size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let format = Self::sniff(&file.bytes).ok_or_else(|| PipelineError::UnsupportedFormat {
            name: file.name.clone(),
            format: file.mime_type.clone(),
        })?;

        if let Some(declared) = file.declared_format() {
            if declared != format {
                tracing::debug!(
                    "{} declared as {} but contains {}",
                    file.name,
                    declared,
                    format
                );
            }
        }
        Ok(format)
    }

    /// Identify the container from its leading bytes.
    pub fn sniff(header: &[u8]) -> Option<OutputFormat> {
        // JPEG: FF D8 FF
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(OutputFormat::Jpeg);
        }

        // PNG: 89 50 4E 47
        if header.starts_with(&[0x89, b'P', b'N', b'G']) {
            return Some(OutputFormat::Png);
        }

        // WebP: RIFF....WEBP
        if header.len() >= 12 && header.starts_with(b"RIFF") && &header[8..12] == b"WEBP" {
            return Some(OutputFormat::Webp);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn validator() -> Validator {
        Validator::new(LimitsConfig::default())
    }

    #[test]
    fn test_magic_bytes_jpeg() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(Validator::sniff(&header), Some(OutputFormat::Jpeg));
    }

    #[test]
    fn test_magic_bytes_png() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(Validator::sniff(&header), Some(OutputFormat::Png));
    }

    #[test]
    fn test_magic_bytes_webp() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P'];
        assert_eq!(Validator::sniff(&header), Some(OutputFormat::Webp));
    }

    #[test]
    fn test_magic_bytes_rejected() {
        // RIFF without the WEBP fourcc is some other container.
        let wav = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'A', b'V', b'E'];
        assert_eq!(Validator::sniff(&wav), None);
        assert_eq!(Validator::sniff(b"GIF89a"), None);
        assert_eq!(Validator::sniff(b"II*\0"), None);
        assert_eq!(Validator::sniff(&[]), None);
    }

    #[test]
    fn test_sniffed_format_wins_over_mime() {
        let file = test_support::source("misnamed.jpg", "image/jpeg", test_support::png_bytes(4, 4));
        assert_eq!(validator().validate(&file).unwrap(), OutputFormat::Png);
    }

    #[test]
    fn test_unsupported_bytes() {
        let file = test_support::source("notes.txt", "text/plain", b"hello world".to_vec());
        assert!(matches!(
            validator().validate(&file),
            Err(PipelineError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_file_too_large() {
        let limits = LimitsConfig {
            max_file_size_mb: 0,
            ..LimitsConfig::default()
        };
        let file = test_support::source("a.jpg", "image/jpeg", test_support::jpeg_bytes(8, 8, 80));
        assert!(matches!(
            Validator::new(limits).validate(&file),
            Err(PipelineError::FileTooLarge { max_mb: 0, .. })
        ));
    }
}
