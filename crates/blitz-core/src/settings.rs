//! Per-job transform settings.
//!
//! A [`TransformSettings`] value is an immutable snapshot handed to every job.
//! Modes are closed enums so that combinations the pipeline cannot honor
//! never reach it; numeric ranges are clamped by [`TransformSettings::normalized`].

use std::fmt;
use std::str::FromStr;

use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// Complete settings snapshot for one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    pub resize: ResizeSettings,
    pub watermark: WatermarkSettings,
    pub signature: SignatureSettings,
    pub output: OutputSettings,
}

/// Largest accepted watermark font size (relative to a 1920 px wide image).
pub const MAX_FONT_SIZE: f32 = 1000.0;

impl TransformSettings {
    /// Return a copy with every numeric field clamped into its legal range.
    pub fn normalized(&self) -> Self {
        let mut s = self.clone();
        if !s.resize.value.is_finite() || s.resize.value < 0.0 {
            s.resize.value = 0.0;
        }
        s.watermark.opacity = clamp_unit(s.watermark.opacity);
        s.watermark.scale = if s.watermark.scale.is_finite() && s.watermark.scale > 0.0 {
            s.watermark.scale.min(1.0)
        } else {
            WatermarkSettings::default().scale
        };
        let font_size = s.watermark.font_size;
        s.watermark.font_size = if font_size.is_finite() && font_size > 0.0 {
            font_size.min(MAX_FONT_SIZE)
        } else {
            WatermarkSettings::default().font_size
        };
        s.signature.scale = if s.signature.scale.is_finite() && s.signature.scale > 0.0 {
            s.signature.scale.min(100.0)
        } else {
            SignatureSettings::default().scale
        };
        s.output.quality = s.output.effective_quality();
        s
    }

    /// True when no stage would touch the pixels.
    pub fn is_pixel_noop(&self) -> bool {
        !self.resize.enabled && !self.watermark.enabled && !self.signature.enabled
    }

    /// Load a preset file holding a bare `TransformSettings` table.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// How the resize target is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMode {
    /// Scale both axes by `value / 100`
    #[default]
    Percentage,
    /// Target width in pixels; height follows the source aspect ratio
    #[serde(alias = "width")]
    AbsoluteWidth,
}

/// Resize stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeSettings {
    pub enabled: bool,
    pub mode: ResizeMode,
    /// Percentage (`Percentage`) or pixel width (`AbsoluteWidth`)
    pub value: f64,
    /// Carried for presets; `AbsoluteWidth` always preserves the aspect ratio
    pub maintain_aspect: bool,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: ResizeMode::Percentage,
            value: 100.0,
            maintain_aspect: true,
        }
    }
}

/// What the watermark stage draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkMode {
    #[default]
    Text,
    Image,
}

/// One of the nine grid placement points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    #[default]
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleLeft,
        Anchor::Center,
        Anchor::MiddleRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::MiddleLeft => "middle-left",
            Anchor::Center => "center",
            Anchor::MiddleRight => "middle-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Anchor::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| format!("unknown anchor '{s}'"))
    }
}

/// Watermark stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    pub enabled: bool,
    pub mode: WatermarkMode,
    pub text: String,
    /// Hex color for text mode (`#RGB`, `#RRGGBB` or `#RRGGBBAA`)
    pub color: String,
    /// Global alpha in [0, 1]
    pub opacity: f32,
    /// Nominal font size at 1920px canvas width
    pub font_size: f32,
    /// Data URL or file path of the logo (image mode)
    pub image_data: Option<String>,
    /// Logo width as a fraction of canvas width, in (0, 1]
    pub scale: f32,
    pub anchor: Anchor,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: WatermarkMode::Text,
            text: "© Blitz".to_string(),
            color: "#ffffff".to_string(),
            opacity: 0.5,
            font_size: 48.0,
            image_data: None,
            scale: 0.3,
            anchor: Anchor::Center,
        }
    }
}

/// Center point of a signature, in percent of canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignaturePosition {
    pub x_pct: f64,
    pub y_pct: f64,
}

impl Default for SignaturePosition {
    fn default() -> Self {
        Self {
            x_pct: 85.0,
            y_pct: 85.0,
        }
    }
}

/// Signature stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureSettings {
    pub enabled: bool,
    pub image_data: Option<String>,
    /// Signature width in percent of canvas width, in (0, 100]
    pub scale: f32,
    pub position: SignaturePosition,
}

impl Default for SignatureSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            image_data: None,
            scale: 20.0,
            position: SignaturePosition::default(),
        }
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Webp => ImageFormat::WebP,
        }
    }

    /// Map a mime type to a format. `image/jpg` is treated as JPEG.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(OutputFormat::Jpeg),
            "image/png" => Some(OutputFormat::Png),
            "image/webp" => Some(OutputFormat::Webp),
            _ => None,
        }
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::WebP => Some(OutputFormat::Webp),
            _ => None,
        }
    }

    /// Map a file extension (without dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "webp" => Some(OutputFormat::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encode stage settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    /// Lossy quality in [0, 1]; ignored for PNG
    pub quality: f32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 0.9,
        }
    }
}

impl OutputSettings {
    /// Quality the encoder will actually use. PNG is always lossless.
    pub fn effective_quality(&self) -> f32 {
        match self.format {
            OutputFormat::Png => 1.0,
            _ => clamp_unit(self.quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_quality_is_always_max() {
        let out = OutputSettings {
            format: OutputFormat::Png,
            quality: 0.2,
        };
        assert_eq!(out.effective_quality(), 1.0);
    }

    #[test]
    fn test_normalized_clamps_ranges() {
        let mut s = TransformSettings::default();
        s.watermark.opacity = 3.0;
        s.watermark.scale = 0.0;
        s.watermark.font_size = 1e11;
        s.signature.scale = 250.0;
        s.output.quality = -1.0;

        let n = s.normalized();
        assert_eq!(n.watermark.font_size, MAX_FONT_SIZE);
        assert_eq!(n.watermark.opacity, 1.0);
        assert_eq!(n.watermark.scale, 0.3);
        assert_eq!(n.signature.scale, 100.0);
        assert_eq!(n.output.quality, 0.0);
    }

    #[test]
    fn test_anchor_parse_roundtrip() {
        for anchor in Anchor::ALL {
            assert_eq!(anchor.as_str().parse::<Anchor>().unwrap(), anchor);
        }
        assert!("upper-left".parse::<Anchor>().is_err());
    }

    #[test]
    fn test_mime_normalization() {
        assert_eq!(OutputFormat::from_mime("image/jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_mime("IMAGE/JPEG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_mime("image/gif"), None);
    }

    #[test]
    fn test_preset_toml_parses_partial_tables() {
        let preset = r##"
            [resize]
            enabled = true
            mode = "absolute_width"
            value = 1280.0

            [watermark]
            enabled = true
            anchor = "bottom-right"

            [output]
            format = "webp"
        "##;
        let s = TransformSettings::from_toml_str(preset).unwrap();
        assert_eq!(s.resize.mode, ResizeMode::AbsoluteWidth);
        assert_eq!(s.watermark.anchor, Anchor::BottomRight);
        assert_eq!(s.watermark.text, "© Blitz");
        assert_eq!(s.output.format, OutputFormat::Webp);
        assert_eq!(s.output.quality, 0.9);
    }

    #[test]
    fn test_unknown_anchor_rejected_in_preset() {
        let preset = "[watermark]\nanchor = \"nowhere\"\n";
        assert!(TransformSettings::from_toml_str(preset).is_err());
    }
}
