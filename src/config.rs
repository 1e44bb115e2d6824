//! Configuration types for the document tools.
//!
//! Every knob the tools read lives in [`ToolsConfig`], built via its
//! [`ToolsConfigBuilder`]. One struct for all tools keeps the CLI mapping
//! trivial and lets a caller share a config across several operations.

use crate::error::DocToolsError;
use crate::progress::{CancelToken, ProgressCallback};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One mebibyte.
pub const MB: u64 = 1024 * 1024;

/// Render scale used by the PDF → image converter.
pub const CONVERTER_RENDER_SCALE: f32 = 2.0;

/// Default name of a merged document.
pub const DEFAULT_MERGE_OUTPUT: &str = "merged_document.pdf";

/// Configuration shared by all document tools.
///
/// # Example
/// ```rust
/// use edgequake_doctools::{QualityTier, ToolsConfig};
///
/// let config = ToolsConfig::builder()
///     .compression_quality(QualityTier::Low)
///     .markdown_api_base("http://localhost:8000")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ToolsConfig {
    /// Client-side file size ceilings.
    pub limits: SizeLimits,

    /// Compressor quality tier. Default: [`QualityTier::Medium`].
    pub compression_quality: QualityTier,

    /// Converter output format. Default: [`ImageFormat::Png`].
    pub image_format: ImageFormat,

    /// Converter quality tier (affects JPEG only). Default: [`QualityTier::High`].
    pub image_quality: QualityTier,

    /// Converter render scale. Default: 2.0.
    pub converter_scale: f32,

    /// Base URL of the service exposing `/api/markdown-convert`.
    pub markdown_api_base: String,

    /// Optional HTTP timeout for the Markdown API. Default: none.
    pub api_timeout_secs: Option<u64>,

    /// File name of a merged document. Default: `merged_document.pdf`.
    pub merge_output_name: String,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,

    /// Cancellation token observed between files and pages.
    pub cancel: CancelToken,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            limits: SizeLimits::default(),
            compression_quality: QualityTier::Medium,
            image_format: ImageFormat::default(),
            image_quality: QualityTier::High,
            converter_scale: CONVERTER_RENDER_SCALE,
            markdown_api_base: "http://localhost:8000".to_string(),
            api_timeout_secs: None,
            merge_output_name: DEFAULT_MERGE_OUTPUT.to_string(),
            progress_callback: None,
            cancel: CancelToken::new(),
        }
    }
}

impl fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("limits", &self.limits)
            .field("compression_quality", &self.compression_quality)
            .field("image_format", &self.image_format)
            .field("image_quality", &self.image_quality)
            .field("converter_scale", &self.converter_scale)
            .field("markdown_api_base", &self.markdown_api_base)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("merge_output_name", &self.merge_output_name)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ToolProgressCallback>"),
            )
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl ToolsConfig {
    /// Create a new builder for `ToolsConfig`.
    pub fn builder() -> ToolsConfigBuilder {
        ToolsConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ToolsConfig`].
#[derive(Debug)]
pub struct ToolsConfigBuilder {
    config: ToolsConfig,
}

impl ToolsConfigBuilder {
    pub fn limits(mut self, limits: SizeLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn compression_quality(mut self, tier: QualityTier) -> Self {
        self.config.compression_quality = tier;
        self
    }

    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.config.image_format = format;
        self
    }

    pub fn image_quality(mut self, tier: QualityTier) -> Self {
        self.config.image_quality = tier;
        self
    }

    pub fn converter_scale(mut self, scale: f32) -> Self {
        self.config.converter_scale = scale;
        self
    }

    pub fn markdown_api_base(mut self, base: impl Into<String>) -> Self {
        self.config.markdown_api_base = base.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn merge_output_name(mut self, name: impl Into<String>) -> Self {
        self.config.merge_output_name = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel = token;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ToolsConfig, DocToolsError> {
        let c = &self.config;
        if !(c.converter_scale.is_finite() && c.converter_scale > 0.0) {
            return Err(DocToolsError::InvalidConfig(format!(
                "converter scale must be > 0, got {}",
                c.converter_scale
            )));
        }
        if reqwest::Url::parse(&c.markdown_api_base).is_err() {
            return Err(DocToolsError::InvalidConfig(format!(
                "markdown API base is not a URL: '{}'",
                c.markdown_api_base
            )));
        }
        if c.merge_output_name.trim().is_empty() {
            return Err(DocToolsError::InvalidConfig(
                "merge output name must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(DocToolsError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Client-side size ceilings, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimits {
    /// Markdown conversion upload ceiling. Default: 50 MB.
    pub markdown_max_bytes: u64,
    /// Per-file ceiling for compression, conversion and split. Default: 100 MB.
    pub pdf_max_bytes: u64,
    /// Aggregate ceiling for a merge batch. Default: 500 MB.
    pub merge_total_max_bytes: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            markdown_max_bytes: 50 * MB,
            pdf_max_bytes: 100 * MB,
            merge_total_max_bytes: 500 * MB,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Three-level quality setting shared by the compressor and converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    High,
    #[default]
    Medium,
    Low,
}

/// Rasterisation parameters for one compressor tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionParams {
    /// Page render scale (1.0 = 72 px per inch).
    pub image_scale: f32,
    /// JPEG quality, 1–100.
    pub jpeg_quality: u8,
}

impl QualityTier {
    /// Compressor mapping: High → (1.0, 80), Medium → (0.8, 60), Low → (0.6, 40).
    pub fn compression_params(self) -> CompressionParams {
        match self {
            QualityTier::High => CompressionParams {
                image_scale: 1.0,
                jpeg_quality: 80,
            },
            QualityTier::Medium => CompressionParams {
                image_scale: 0.8,
                jpeg_quality: 60,
            },
            QualityTier::Low => CompressionParams {
                image_scale: 0.6,
                jpeg_quality: 40,
            },
        }
    }

    /// Converter JPEG quality: High → 100, Medium → 70, Low → 50.
    ///
    /// WebP output is lossless and does not use this value.
    pub fn converter_jpeg_quality(self) -> u8 {
        match self {
            QualityTier::High => 100,
            QualityTier::Medium => 70,
            QualityTier::Low => 50,
        }
    }
}

/// Bitmap formats the converter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_tool_ceilings() {
        let l = SizeLimits::default();
        assert_eq!(l.markdown_max_bytes, 50 * 1024 * 1024);
        assert_eq!(l.pdf_max_bytes, 100 * 1024 * 1024);
        assert_eq!(l.merge_total_max_bytes, 500 * 1024 * 1024);
    }

    #[test]
    fn compression_tiers_are_ordered() {
        let h = QualityTier::High.compression_params();
        let m = QualityTier::Medium.compression_params();
        let l = QualityTier::Low.compression_params();
        assert_eq!((h.image_scale, h.jpeg_quality), (1.0, 80));
        assert_eq!((m.image_scale, m.jpeg_quality), (0.8, 60));
        assert_eq!((l.image_scale, l.jpeg_quality), (0.6, 40));
    }

    #[test]
    fn builder_rejects_bad_scale() {
        assert!(ToolsConfig::builder().converter_scale(0.0).build().is_err());
        assert!(ToolsConfig::builder()
            .converter_scale(f32::NAN)
            .build()
            .is_err());
    }

    #[test]
    fn builder_rejects_bad_api_base() {
        let err = ToolsConfig::builder()
            .markdown_api_base("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a URL"));
    }

    #[test]
    fn builder_defaults_are_valid() {
        let c = ToolsConfig::builder().build().unwrap();
        assert_eq!(c.merge_output_name, "merged_document.pdf");
        assert_eq!(c.converter_scale, 2.0);
        assert!(c.api_timeout_secs.is_none());
    }

    #[test]
    fn image_format_extensions() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpeg");
        assert_eq!(ImageFormat::Webp.mime_type(), "image/webp");
    }
}
