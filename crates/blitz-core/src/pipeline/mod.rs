//! Image transform pipeline components.
//!
//! This module contains all the stages of a transform job:
//! - **validate**: Size and magic-byte checks before decoding
//! - **decode**: Load and decode JPEG, PNG and WebP bytes
//! - **bypass**: Skip the pipeline when the settings are a no-op
//! - **resize**: Percentage or absolute-width scaling
//! - **watermark**: Text or logo overlay at a grid anchor
//! - **signature**: Image overlay centered on a percentage point
//! - **encode**: Rasterize to the requested format and quality
//! - **metadata**: EXIF summaries for reports
//! - **processor**: Orchestrates the full pipeline
//! - **discovery**: Find image files in directories
//! - **channel**: Bounded channels for backpressure

pub mod bypass;
pub mod channel;
pub mod composite;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod metadata;
pub mod overlay;
pub mod position;
pub mod processor;
pub mod resize;
pub mod signature;
pub mod validate;
pub mod watermark;

// Re-exports for convenient access
pub use bypass::should_bypass;
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use metadata::MetadataExtractor;
pub use overlay::OverlayError;
pub use position::{center_on_percentage, AnchoredBox, Point};
pub use processor::{ProcessOptions, TransformPipeline};
pub use validate::Validator;
