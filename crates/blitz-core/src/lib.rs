//! Blitz Core - Embeddable batch image transform library.
//!
//! Blitz takes JPEG, PNG or WebP bytes plus a settings snapshot and produces
//! a transformed image: resized, watermarked, signed and re-encoded, with the
//! source EXIF block carried into JPEG outputs.
//!
//! # Architecture
//!
//! Every job runs in its own worker and talks to the caller only through
//! messages:
//!
//! ```text
//! Bytes → Validate → [Bypass?] → Decode → Resize → Watermark → Signature → Encode → EXIF → Artifact
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use blitz_core::{Config, Dispatcher, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> blitz_core::Result<()> {
//!     let config = Config::load()?;
//!     let dispatcher = Dispatcher::new(&config);
//!
//!     let file = SourceFile::from_path("./beach.jpg".as_ref()).await?;
//!     let output = dispatcher.submit(file, config.transform.clone()).await?;
//!     println!("{}x{} {}", output.artifact.width, output.artifact.height, output.artifact.format);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exif;
pub mod output;
pub mod pipeline;
pub mod settings;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use config::Config;
pub use dispatch::{BatchItem, Dispatcher, JobId};
pub use error::{BlitzError, ConfigError, PipelineError, PipelineResult, Result};
pub use output::{OutputWriter, ReportFormat};
pub use pipeline::{DiscoveredFile, FileDiscovery, ProcessOptions, TransformPipeline};
pub use settings::{
    Anchor, OutputFormat, OutputSettings, ResizeMode, ResizeSettings, SignaturePosition,
    SignatureSettings, TransformSettings, WatermarkMode, WatermarkSettings,
};
pub use types::{
    Artifact, ExifData, JobOutput, JobReport, ProcessingStats, SourceFile, Stage, StageWarning,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_dispatcher_from_default_config() {
        let config = Config::default();
        let dispatcher = Dispatcher::new(&config);
        assert!(dispatcher.options().allow_bypass);
    }
}
