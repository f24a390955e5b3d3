//! Core data types for the Blitz transform pipeline.
//!
//! These types cross the job boundary: a [`SourceFile`] goes into a job and a
//! [`JobOutput`] comes back. [`JobReport`] is the per-file record written by
//! the batch front-end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::settings::OutputFormat;

/// Raw input for one job: bytes plus the name and mime type they arrived with.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name, used in error messages and output naming
    pub name: String,
    /// Declared mime type (`image/jpeg`, `image/png`, ...)
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk. The mime type is derived from the extension.
    pub async fn from_path(path: &Path) -> PipelineResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(path.display().to_string()),
            _ => PipelineError::Decode {
                name: name.clone(),
                message: format!("Cannot read file: {}", e),
            },
        })?;

        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
            .map(|f| f.mime_type())
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    /// Format implied by the declared mime type.
    pub fn declared_format(&self) -> Option<OutputFormat> {
        OutputFormat::from_mime(&self.mime_type)
    }
}

/// Encoded result image. Ownership passes to the caller.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

/// Pipeline stage that can degrade without failing the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Watermark,
    Signature,
    Metadata,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Watermark => "watermark",
            Stage::Signature => "signature",
            Stage::Metadata => "metadata",
        })
    }
}

/// A recovered failure recorded against a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageWarning {
    pub stage: Stage,
    pub message: String,
}

impl StageWarning {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Everything a successful job hands back.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub artifact: Artifact,
    /// Source pixel dimensions
    pub source_width: u32,
    pub source_height: u32,
    /// The original bytes were returned without re-encoding
    pub bypassed: bool,
    /// The artifact carries the source's EXIF block
    pub metadata_preserved: bool,
    pub warnings: Vec<StageWarning>,
    /// Summary of the source's EXIF, if it had any
    pub exif: Option<ExifData>,
}

/// EXIF metadata summary for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExifData {
    /// When the photo was captured (EXIF `YYYY:MM:DD HH:MM:SS`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,

    /// Camera manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,

    /// Camera model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,

    /// GPS latitude (decimal degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_latitude: Option<f64>,

    /// GPS longitude (decimal degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_longitude: Option<f64>,

    /// ISO sensitivity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,

    /// Aperture (e.g., "f/1.8")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,

    /// Shutter speed (e.g., "1/1000")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,

    /// Focal length in mm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f32>,

    /// Image orientation (1-8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u32>,
}

impl ExifData {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-file record written to the batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Path of the source file
    pub file_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// Where the artifact was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Output format ("jpeg", "png", "webp")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Source size in bytes
    pub source_size: u64,

    /// Artifact size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u64>,

    /// Relative size change, negative when the output is smaller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_change_pct: Option<f64>,

    pub bypassed: bool,

    pub metadata_preserved: bool,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<StageWarning>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifData>,

    /// Failure message when the job did not produce an artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobReport {
    /// Record for a job that produced an artifact.
    pub fn success(
        file_path: &Path,
        output_path: Option<PathBuf>,
        source_size: u64,
        output: &JobOutput,
    ) -> Self {
        let output_size = output.artifact.bytes.len() as u64;
        let size_change_pct = (source_size > 0)
            .then(|| (output_size as f64 - source_size as f64) / source_size as f64 * 100.0);

        Self {
            output_path,
            source_width: Some(output.source_width),
            source_height: Some(output.source_height),
            width: Some(output.artifact.width),
            height: Some(output.artifact.height),
            format: Some(output.artifact.format),
            output_size: Some(output_size),
            size_change_pct,
            bypassed: output.bypassed,
            metadata_preserved: output.metadata_preserved,
            warnings: output.warnings.clone(),
            exif: output.exif.clone(),
            ..Self::empty(file_path, source_size)
        }
    }

    /// Record for a job that failed, or whose artifact could not be saved.
    pub fn failure(file_path: &Path, source_size: u64, error: &dyn fmt::Display) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::empty(file_path, source_size)
        }
    }

    fn empty(file_path: &Path, source_size: u64) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            file_name: file_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string(),
            output_path: None,
            source_width: None,
            source_height: None,
            width: None,
            height: None,
            format: None,
            source_size,
            output_size: None,
            size_change_pct: None,
            bypassed: false,
            metadata_preserved: false,
            warnings: Vec::new(),
            exif: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Processing statistics for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessingStats {
    /// Jobs that produced an artifact
    pub succeeded: usize,

    /// Jobs that failed
    pub failed: usize,

    /// Successful jobs that returned the original bytes
    pub bypassed: usize,

    /// Total source bytes of successful jobs
    pub bytes_in: u64,

    /// Total artifact bytes
    pub bytes_out: u64,

    /// Processing rate in images per second
    pub images_per_second: f64,

    /// Total processing time in seconds
    pub total_seconds: f64,
}

impl ProcessingStats {
    pub fn record(&mut self, report: &JobReport) {
        match report.output_size {
            Some(out) if report.is_success() => {
                self.succeeded += 1;
                if report.bypassed {
                    self.bypassed += 1;
                }
                self.bytes_in += report.source_size;
                self.bytes_out += out;
            }
            _ => self.failed += 1,
        }
    }

    /// Megabytes saved across successful jobs; negative when outputs grew.
    pub fn mb_saved(&self) -> f64 {
        (self.bytes_in as f64 - self.bytes_out as f64) / (1024.0 * 1024.0)
    }
}
