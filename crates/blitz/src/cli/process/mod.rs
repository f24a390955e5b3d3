//! The `blitz process` command for transforming images.

mod batch;
mod naming;
mod setup;
pub mod types;

pub use types::{ReportFormatArg, TargetFormat};

use blitz_core::{Anchor, Config, Dispatcher, ReportFormat, TransformSettings};
use clap::Args;
use std::path::PathBuf;

use batch::process_batch;
use naming::OutputNamer;
use setup::setup_processor;

/// Arguments for the `process` command.
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Image file or directory to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// Directory for transformed images (defaults to `output.dir`)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// TOML file with a full or partial transform preset
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Scale both sides by this percentage
    #[arg(long, conflicts_with = "resize_width")]
    pub resize_percent: Option<f64>,

    /// Scale to this width in pixels, keeping the aspect ratio
    #[arg(long)]
    pub resize_width: Option<u32>,

    /// Stamp this text as a watermark
    #[arg(long, conflicts_with = "watermark_image")]
    pub watermark_text: Option<String>,

    /// Watermark text color (#RGB, #RRGGBB or #RRGGBBAA)
    #[arg(long)]
    pub watermark_color: Option<String>,

    /// Watermark opacity from 0.0 to 1.0
    #[arg(long)]
    pub watermark_opacity: Option<f32>,

    /// Watermark font size, relative to a 1920 px wide image
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Stamp this image as a watermark
    #[arg(long)]
    pub watermark_image: Option<PathBuf>,

    /// Watermark image width as a fraction of the canvas width
    #[arg(long)]
    pub watermark_scale: Option<f32>,

    /// Watermark position (e.g. bottom-right)
    #[arg(long)]
    pub anchor: Option<Anchor>,

    /// Signature image to place on every output
    #[arg(long)]
    pub signature: Option<PathBuf>,

    /// Signature width as a percentage of the canvas width
    #[arg(long)]
    pub signature_scale: Option<f32>,

    /// Horizontal signature center, percent of the canvas width
    #[arg(long)]
    pub signature_x: Option<f64>,

    /// Vertical signature center, percent of the canvas height
    #[arg(long)]
    pub signature_y: Option<f64>,

    /// Output image format
    #[arg(long, value_enum)]
    pub to: Option<TargetFormat>,

    /// Output quality from 0.0 to 1.0 (ignored for PNG)
    #[arg(long)]
    pub quality: Option<f32>,

    /// Rename outputs with a pattern using {original}, {n} and {date}
    #[arg(long)]
    pub rename: Option<String>,

    /// First value of {n}
    #[arg(long)]
    pub start: Option<u64>,

    /// Number of jobs in flight at once
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Report file (JSONL reports go to stdout when omitted)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormatArg>,

    /// Always run the full pipeline, even when the settings change nothing
    #[arg(long)]
    pub force_reencode: bool,

    /// Drop EXIF metadata from JPEG outputs
    #[arg(long)]
    pub strip_metadata: bool,
}

/// Everything the batch loop needs, assembled by setup_processor().
pub(crate) struct ProcessContext {
    pub dispatcher: Dispatcher,
    pub settings: TransformSettings,
    pub namer: OutputNamer,
    pub report_format: ReportFormat,
    pub config: Config,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let ctx = setup_processor(&args, config)?;

    let files = blitz_core::FileDiscovery::new(ctx.config.processing.clone()).discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to process", files.len());

    process_batch(ctx, &args, files).await
}
