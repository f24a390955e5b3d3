//! Decide whether a job can hand back the source bytes untouched.

use crate::settings::{OutputFormat, TransformSettings};

/// Lossy quality at or above which re-encoding is not worth it.
pub const BYPASS_MIN_QUALITY: f32 = 0.9;

/// True when running the pipeline would only re-encode the source into its
/// own format at high quality.
pub fn should_bypass(source: OutputFormat, settings: &TransformSettings) -> bool {
    settings.output.format == source
        && settings.is_pixel_noop()
        && (settings.output.format == OutputFormat::Png
            || settings.output.quality >= BYPASS_MIN_QUALITY)
}
