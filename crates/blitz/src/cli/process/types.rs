//! CLI enum types for the process command: report format and target format.

use blitz_core::{OutputFormat, ReportFormat};
use clap::ValueEnum;

/// Report formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormatArg {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl std::fmt::Display for ReportFormatArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormatArg::Json => write!(f, "json"),
            ReportFormatArg::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Json => ReportFormat::Json,
            ReportFormatArg::Jsonl => ReportFormat::JsonLines,
        }
    }
}

/// Output image formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TargetFormat {
    #[value(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
}

impl From<TargetFormat> for OutputFormat {
    fn from(arg: TargetFormat) -> Self {
        match arg {
            TargetFormat::Jpeg => OutputFormat::Jpeg,
            TargetFormat::Png => OutputFormat::Png,
            TargetFormat::Webp => OutputFormat::Webp,
        }
    }
}
