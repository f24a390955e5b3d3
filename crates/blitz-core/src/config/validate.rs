//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::ReportFormat;
use crate::settings::{TransformSettings, MAX_FONT_SIZE};

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.pipeline.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_size must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.job_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.job_timeout_ms must be > 0".into(),
            ));
        }
        if ReportFormat::parse(&self.output.report_format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.report_format must be \"json\" or \"jsonl\", got \"{}\"",
                self.output.report_format
            )));
        }
        validate_transform(&self.transform, "transform")
    }
}

/// Range-check a settings snapshot. `prefix` names the table in messages.
pub fn validate_transform(s: &TransformSettings, prefix: &str) -> Result<(), ConfigError> {
    if s.resize.enabled && s.resize.value <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "{prefix}.resize.value must be > 0"
        )));
    }
    if !(0.0..=1.0).contains(&s.watermark.opacity) {
        return Err(ConfigError::ValidationError(format!(
            "{prefix}.watermark.opacity must be between 0.0 and 1.0"
        )));
    }
    if !(s.watermark.scale > 0.0 && s.watermark.scale <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "{prefix}.watermark.scale must be in (0.0, 1.0]"
        )));
    }
    if !(s.watermark.font_size > 0.0 && s.watermark.font_size <= MAX_FONT_SIZE) {
        return Err(ConfigError::ValidationError(format!(
            "{prefix}.watermark.font_size must be in (0, {MAX_FONT_SIZE}]"
        )));
    }
    if !(s.signature.scale > 0.0 && s.signature.scale <= 100.0) {
        return Err(ConfigError::ValidationError(format!(
            "{prefix}.signature.scale must be in (0, 100]"
        )));
    }
    if !(0.0..=1.0).contains(&s.output.quality) {
        return Err(ConfigError::ValidationError(format!(
            "{prefix}.output.quality must be between 0.0 and 1.0"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_parallel_workers() {
        let mut config = Config::default();
        config.processing.parallel_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("parallel_workers"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.job_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("job_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_unknown_report_format() {
        let mut config = Config::default();
        config.output.report_format = "csv".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("report_format"));
    }

    #[test]
    fn test_validate_rejects_invalid_opacity() {
        let mut config = Config::default();
        config.transform.watermark.opacity = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("transform.watermark.opacity"));
    }

    #[test]
    fn test_validate_rejects_signature_scale_out_of_range() {
        let mut config = Config::default();
        config.transform.signature.scale = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("signature.scale"));
    }

    #[test]
    fn test_validate_rejects_huge_font_size() {
        let mut s = TransformSettings::default();
        s.watermark.font_size = 1e11;
        let err = validate_transform(&s, "settings").unwrap_err();
        assert!(err.to_string().contains("settings.watermark.font_size"));

        s.watermark.font_size = MAX_FONT_SIZE;
        assert!(validate_transform(&s, "settings").is_ok());
    }

    #[test]
    fn test_validate_transform_prefix_in_message() {
        let mut s = TransformSettings::default();
        s.output.quality = 2.0;
        let err = validate_transform(&s, "preset").unwrap_err();
        assert!(err.to_string().contains("preset.output.quality"));
    }
}
