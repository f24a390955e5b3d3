//! Processor setup: config overrides, preset loading, dispatcher creation.

use anyhow::Context;
use blitz_core::config::validate_transform;
use blitz_core::{
    Config, Dispatcher, ProcessOptions, ReportFormat, ResizeMode, TransformSettings,
    WatermarkMode,
};
use std::path::Path;

use super::naming::OutputNamer;
use super::{ProcessArgs, ProcessContext};

/// Validate input, merge config, preset and flags, and assemble the context.
pub fn setup_processor(args: &ProcessArgs, mut config: Config) -> anyhow::Result<ProcessContext> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    apply_config_overrides(&mut config, args);
    if config.processing.parallel_workers == 0 {
        anyhow::bail!("--parallel must be at least 1");
    }

    let base = match &args.preset {
        Some(path) => load_preset(path)?,
        None => config.transform.clone(),
    };
    let settings = build_settings(base, args);
    validate_transform(&settings, "settings")?;

    let report_format = match args.format {
        Some(arg) => arg.into(),
        None => ReportFormat::parse(&config.output.report_format).unwrap_or(ReportFormat::Json),
    };

    let options = ProcessOptions {
        allow_bypass: !args.force_reencode,
        preserve_metadata: !args.strip_metadata,
    };
    let dispatcher = Dispatcher::new(&config).with_options(options);
    let namer = OutputNamer::new(
        config.output_dir(),
        &config.output.rename,
        settings.output.format,
    );

    tracing::debug!(
        "Workers: {}, output: {:?}, format: {}",
        config.processing.parallel_workers,
        config.output_dir(),
        settings.output.format
    );

    Ok(ProcessContext {
        dispatcher,
        settings,
        namer,
        report_format,
        config,
    })
}

/// Flags that live in the config file rather than in the settings snapshot.
fn apply_config_overrides(config: &mut Config, args: &ProcessArgs) {
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel;
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(pattern) = &args.rename {
        config.output.rename.enabled = true;
        config.output.rename.pattern = pattern.clone();
    }
    if let Some(start) = args.start {
        config.output.rename.start_sequence = start;
    }
}

fn load_preset(path: &Path) -> anyhow::Result<TransformSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read preset {:?}", path))?;
    TransformSettings::from_toml_str(&content)
        .with_context(|| format!("Failed to parse preset {:?}", path))
}

/// Layer command-line flags over a base snapshot.
///
/// Naming an overlay source (text, image or signature) turns its stage on.
fn build_settings(mut s: TransformSettings, args: &ProcessArgs) -> TransformSettings {
    if let Some(percent) = args.resize_percent {
        s.resize.enabled = true;
        s.resize.mode = ResizeMode::Percentage;
        s.resize.value = percent;
    }
    if let Some(width) = args.resize_width {
        s.resize.enabled = true;
        s.resize.mode = ResizeMode::AbsoluteWidth;
        s.resize.value = f64::from(width);
    }

    if let Some(text) = &args.watermark_text {
        s.watermark.enabled = true;
        s.watermark.mode = WatermarkMode::Text;
        s.watermark.text = text.clone();
    }
    if let Some(path) = &args.watermark_image {
        s.watermark.enabled = true;
        s.watermark.mode = WatermarkMode::Image;
        s.watermark.image_data = Some(path.to_string_lossy().into_owned());
    }
    if let Some(color) = &args.watermark_color {
        s.watermark.color = color.clone();
    }
    if let Some(opacity) = args.watermark_opacity {
        s.watermark.opacity = opacity;
    }
    if let Some(size) = args.font_size {
        s.watermark.font_size = size;
    }
    if let Some(scale) = args.watermark_scale {
        s.watermark.scale = scale;
    }
    if let Some(anchor) = args.anchor {
        s.watermark.anchor = anchor;
    }

    if let Some(path) = &args.signature {
        s.signature.enabled = true;
        s.signature.image_data = Some(path.to_string_lossy().into_owned());
    }
    if let Some(scale) = args.signature_scale {
        s.signature.scale = scale;
    }
    if let Some(x) = args.signature_x {
        s.signature.position.x_pct = x;
    }
    if let Some(y) = args.signature_y {
        s.signature.position.y_pct = y;
    }

    if let Some(format) = args.to {
        s.output.format = format.into();
    }
    if let Some(quality) = args.quality {
        s.output.quality = quality;
    }
    s
}
