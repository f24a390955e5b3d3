//! Error types for the Blitz transform pipeline.
//!
//! Only failures that make a job unusable propagate to the caller: decode,
//! encode and execution-context failures (plus the input guards). Overlay
//! asset and EXIF problems are recovered inside the pipeline and surface as
//! [`StageWarning`](crate::types::StageWarning)s instead.

use thiserror::Error;

/// Top-level error type for Blitz operations.
#[derive(Error, Debug)]
pub enum BlitzError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors that fail a single job.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Source bytes could not be decoded
    #[error("Decode error for {name}: {message}")]
    Decode { name: String, message: String },

    /// The destination codec refused the canvas
    #[error("Encode error ({format}): {message}")]
    Encode { format: String, message: String },

    /// The isolated job context crashed, hung up, or sent a malformed reply
    #[error("Processing error in {job_id}: {message}")]
    Context { job_id: String, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {name} after {timeout_ms}ms")]
    Timeout {
        name: String,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {name} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        name: String,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {name} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        name: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {name}: {format}")]
    UnsupportedFormat { name: String, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Convenience type alias for Blitz results.
pub type Result<T> = std::result::Result<T, BlitzError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_messages_carry_context() {
        let err = PipelineError::Decode {
            name: "beach.jpg".into(),
            message: "truncated".into(),
        };
        assert_eq!(err.to_string(), "Decode error for beach.jpg: truncated");

        let err = PipelineError::Timeout {
            name: "beach.jpg".into(),
            stage: "job".into(),
            timeout_ms: 500,
        };
        assert!(err.to_string().contains("after 500ms"));
    }

    #[test]
    fn test_pipeline_error_converts_to_blitz_error() {
        let err: BlitzError = PipelineError::FileNotFound("a.png".into()).into();
        assert!(matches!(err, BlitzError::Pipeline(_)));
    }
}
