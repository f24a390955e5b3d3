//! Pipeline orchestration: decode, resize, watermark, signature, encode.

use std::time::Instant;

use crate::config::LimitsConfig;
use crate::error::PipelineResult;
use crate::exif;
use crate::settings::{OutputFormat, TransformSettings};
use crate::types::{Artifact, ExifData, JobOutput, SourceFile, Stage, StageWarning};

use super::bypass::should_bypass;
use super::decode::ImageDecoder;
use super::encode::encode;
use super::metadata::MetadataExtractor;
use super::resize::{resize, target_dimensions};
use super::validate::Validator;
use super::{signature, watermark};

/// Options for controlling pipeline behavior beyond the per-job settings.
#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    /// Return the source bytes when the settings are a no-op
    pub allow_bypass: bool,
    /// Carry EXIF from a JPEG source into a JPEG artifact
    pub preserve_metadata: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            allow_bypass: true,
            preserve_metadata: true,
        }
    }
}

/// Runs one job's stages. Holds no per-job state, so one value can serve
/// many jobs, but the dispatcher gives every job its own.
pub struct TransformPipeline {
    validator: Validator,
    decoder: ImageDecoder,
    options: ProcessOptions,
}

impl TransformPipeline {
    pub fn new(limits: LimitsConfig, options: ProcessOptions) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            decoder: ImageDecoder::new(limits),
            options,
        }
    }

    /// Transform one source image.
    ///
    /// Only decode and encode failures (and the input guards) are errors.
    /// Overlay and metadata problems are returned as warnings.
    pub fn run(&self, file: &SourceFile, settings: &TransformSettings) -> PipelineResult<JobOutput> {
        let start = Instant::now();
        tracing::debug!("Processing: {}", file.name);

        let source_format = self.validator.validate(file)?;
        let exif_summary = MetadataExtractor::extract(&file.bytes);

        let output = if self.options.allow_bypass && should_bypass(source_format, settings) {
            self.bypass(file, source_format, exif_summary)?
        } else {
            self.transform(file, source_format, settings, exif_summary)?
        };

        tracing::debug!(
            "Processed {} in {:?} ({}x{} -> {}x{}{})",
            file.name,
            start.elapsed(),
            output.source_width,
            output.source_height,
            output.artifact.width,
            output.artifact.height,
            if output.bypassed { ", bypassed" } else { "" }
        );
        Ok(output)
    }

    /// Hand back the source bytes, probing only the header for dimensions.
    fn bypass(
        &self,
        file: &SourceFile,
        format: OutputFormat,
        exif_summary: Option<ExifData>,
    ) -> PipelineResult<JobOutput> {
        let (width, height) = self.decoder.probe(file)?;
        let mut warnings = Vec::new();
        let mut bytes = file.bytes.clone();
        // The summary can be empty while EXIF is present, so look at the bytes.
        let mut metadata_preserved = format == OutputFormat::Jpeg && exif::load(&bytes).is_some();

        if format == OutputFormat::Jpeg && !self.options.preserve_metadata {
            match exif::remove(&bytes) {
                Ok(stripped) => bytes = stripped,
                Err(e) => record_metadata_warning(&mut warnings, &e.to_string()),
            }
            metadata_preserved = false;
        }

        Ok(JobOutput {
            artifact: Artifact {
                bytes,
                width,
                height,
                format,
            },
            source_width: width,
            source_height: height,
            bypassed: true,
            metadata_preserved,
            warnings,
            exif: exif_summary,
        })
    }

    fn transform(
        &self,
        file: &SourceFile,
        source_format: OutputFormat,
        settings: &TransformSettings,
        exif_summary: Option<ExifData>,
    ) -> PipelineResult<JobOutput> {
        let mut warnings = Vec::new();

        let stage = Instant::now();
        let decoded = self.decoder.decode(file)?;
        let (source_width, source_height) = (decoded.width, decoded.height);
        tracing::trace!("  Decode: {:?}", stage.elapsed());

        // Upscaling can exceed what the input guard let through.
        let (target_width, target_height) =
            target_dimensions(source_width, source_height, &settings.resize);
        self.decoder.check_dimensions(file, target_width, target_height)?;

        let stage = Instant::now();
        let resized = resize(decoded.image, &settings.resize);
        tracing::trace!("  Resize: {:?}", stage.elapsed());

        // The decoded bitmap is consumed here; only the canvas stays alive.
        let mut canvas = resized.into_rgba8();
        let (width, height) = canvas.dimensions();

        let stage = Instant::now();
        watermark::apply(&mut canvas, &settings.watermark, &mut warnings);
        tracing::trace!("  Watermark: {:?}", stage.elapsed());

        let stage = Instant::now();
        signature::apply(&mut canvas, &settings.signature, &mut warnings);
        tracing::trace!("  Signature: {:?}", stage.elapsed());

        let stage = Instant::now();
        let mut bytes = encode(canvas, &settings.output)?;
        tracing::trace!("  Encode: {:?}", stage.elapsed());

        let mut metadata_preserved = false;
        if self.options.preserve_metadata
            && source_format == OutputFormat::Jpeg
            && settings.output.format == OutputFormat::Jpeg
        {
            match exif::carry_forward(&file.bytes, &bytes) {
                Ok(Some(with_exif)) => {
                    bytes = with_exif;
                    metadata_preserved = true;
                }
                Ok(None) => {}
                Err(e) => record_metadata_warning(&mut warnings, &e.to_string()),
            }
        }

        Ok(JobOutput {
            artifact: Artifact {
                bytes,
                width,
                height,
                format: settings.output.format,
            },
            source_width,
            source_height,
            bypassed: false,
            metadata_preserved,
            warnings,
            exif: exif_summary,
        })
    }
}

fn record_metadata_warning(warnings: &mut Vec<StageWarning>, message: &str) {
    tracing::warn!("Metadata not carried over: {}", message);
    warnings.push(StageWarning::new(Stage::Metadata, message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::exif::tags;
    use crate::settings::{ResizeMode, WatermarkMode};
    use crate::test_support;
    use image::GenericImageView;

    fn pipeline() -> TransformPipeline {
        TransformPipeline::new(LimitsConfig::default(), ProcessOptions::default())
    }

    fn jpeg_settings(quality: f32) -> TransformSettings {
        let mut s = TransformSettings::default();
        s.output.format = OutputFormat::Jpeg;
        s.output.quality = quality;
        s
    }

    fn photo() -> SourceFile {
        test_support::source(
            "photo.jpg",
            "image/jpeg",
            test_support::jpeg_with_exif(1000, 800, 90, &test_support::sample_ifd()),
        )
    }

    #[test]
    fn test_process_options_default() {
        let options = ProcessOptions::default();
        assert!(options.allow_bypass);
        assert!(options.preserve_metadata);
    }

    #[test]
    fn test_resize_half_is_not_bypassed() {
        let mut settings = jpeg_settings(0.95);
        settings.resize.enabled = true;
        settings.resize.mode = ResizeMode::Percentage;
        settings.resize.value = 50.0;

        let out = pipeline().run(&photo(), &settings).unwrap();
        assert!(!out.bypassed);
        assert_eq!((out.artifact.width, out.artifact.height), (500, 400));
        assert_eq!((out.source_width, out.source_height), (1000, 800));

        let decoded = image::load_from_memory(&out.artifact.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (500, 400));
    }

    #[test]
    fn test_noop_is_bypassed_byte_for_byte() {
        let source = photo();
        let out = pipeline().run(&source, &jpeg_settings(0.95)).unwrap();

        assert!(out.bypassed);
        assert_eq!(out.artifact.bytes, source.bytes);
        assert_eq!((out.artifact.width, out.artifact.height), (1000, 800));
        assert!(out.metadata_preserved);
    }

    #[test]
    fn test_bypass_reports_exif_without_summary_tags() {
        // Only a resolution tag: nothing for the summary, but EXIF is there.
        let mut map = exif::IfdMap::default();
        map.zeroth.insert(282, exif::IfdValue::Rational(vec![(300, 1)]));
        let source = test_support::source(
            "plain.jpg",
            "image/jpeg",
            test_support::jpeg_with_exif(64, 48, 90, &map),
        );

        let out = pipeline().run(&source, &jpeg_settings(0.95)).unwrap();
        assert!(out.bypassed);
        assert!(out.exif.is_none());
        assert!(out.metadata_preserved);
    }

    #[test]
    fn test_png_noop_bypasses_at_low_quality() {
        let source = test_support::source("a.png", "image/png", test_support::png_bytes(20, 10));
        let mut settings = TransformSettings::default();
        settings.output.format = OutputFormat::Png;
        settings.output.quality = 0.2;

        let out = pipeline().run(&source, &settings).unwrap();
        assert!(out.bypassed);
        assert_eq!(out.artifact.bytes, source.bytes);
    }

    #[test]
    fn test_reencode_keeps_date_time_original() {
        let out = pipeline().run(&photo(), &jpeg_settings(0.8)).unwrap();
        assert!(!out.bypassed);
        assert!(out.metadata_preserved);

        let map = exif::load(&out.artifact.bytes).unwrap();
        assert_eq!(
            map.get(exif::Ifd::Exif, tags::DATE_TIME_ORIGINAL)
                .and_then(|v| v.as_ascii())
                .as_deref(),
            Some("2024:05:01 10:20:30")
        );
        assert_eq!(
            out.exif.and_then(|e| e.captured_at).as_deref(),
            Some("2024:05:01 10:20:30")
        );
    }

    #[test]
    fn test_force_reencode_disables_bypass() {
        let options = ProcessOptions {
            allow_bypass: false,
            ..ProcessOptions::default()
        };
        let source = photo();
        let out = TransformPipeline::new(LimitsConfig::default(), options)
            .run(&source, &jpeg_settings(0.95))
            .unwrap();
        assert!(!out.bypassed);
        assert_ne!(out.artifact.bytes, source.bytes);
    }

    #[test]
    fn test_strip_metadata() {
        let options = ProcessOptions {
            preserve_metadata: false,
            ..ProcessOptions::default()
        };
        let pipeline = TransformPipeline::new(LimitsConfig::default(), options);

        for quality in [0.95, 0.5] {
            let out = pipeline.run(&photo(), &jpeg_settings(quality)).unwrap();
            assert!(!out.metadata_preserved);
            assert!(exif::load(&out.artifact.bytes).is_none());
        }
    }

    #[test]
    fn test_format_change_drops_exif_silently() {
        let mut settings = TransformSettings::default();
        settings.output.format = OutputFormat::Png;

        let out = pipeline().run(&photo(), &settings).unwrap();
        assert_eq!(out.artifact.format, OutputFormat::Png);
        assert!(!out.metadata_preserved);
        assert!(out.warnings.is_empty());
        assert_eq!(
            image::guess_format(&out.artifact.bytes).unwrap(),
            image::ImageFormat::Png
        );
    }

    #[test]
    fn test_broken_overlays_degrade_to_warnings() {
        let mut settings = jpeg_settings(0.8);
        settings.resize.enabled = true;
        settings.resize.mode = ResizeMode::AbsoluteWidth;
        settings.resize.value = 200.0;
        settings.watermark.enabled = true;
        settings.watermark.mode = WatermarkMode::Image;
        settings.watermark.image_data = Some("data:image/png;base64,????".into());
        settings.signature.enabled = true;

        let out = pipeline().run(&photo(), &settings).unwrap();
        assert_eq!((out.artifact.width, out.artifact.height), (200, 160));
        let stages: Vec<Stage> = out.warnings.iter().map(|w| w.stage).collect();
        assert_eq!(stages, vec![Stage::Watermark, Stage::Signature]);
    }

    #[test]
    fn test_upscale_past_dimension_limit_fails() {
        let limits = LimitsConfig {
            max_image_dimension: 50,
            ..LimitsConfig::default()
        };
        let source = test_support::source("a.png", "image/png", test_support::png_bytes(40, 40));
        let mut settings = TransformSettings::default();
        settings.output.format = OutputFormat::Png;
        settings.resize.enabled = true;
        settings.resize.mode = ResizeMode::Percentage;
        settings.resize.value = 500.0;

        let err = TransformPipeline::new(limits, ProcessOptions::default())
            .run(&source, &settings)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ImageTooLarge {
                width: 200,
                height: 200,
                max_dim: 50,
                ..
            }
        ));
    }

    #[test]
    fn test_corrupt_source_fails() {
        // Passes the magic-byte check, but nothing after it is a JPEG.
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.extend_from_slice(&[0x13; 64]);
        let source = test_support::source("broken.jpg", "image/jpeg", bytes);

        let err = pipeline().run(&source, &jpeg_settings(0.5)).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
