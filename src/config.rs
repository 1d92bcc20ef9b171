//! Configuration types for PDF OCR runs.
//!
//! All run behaviour is controlled through [`OcrConfig`], built via its
//! [`OcrConfigBuilder`]. The API credential is not a field
//! here: it is handed straight to [`crate::backend::OpenRouterBackend::new`]
//! (or to [`crate::ocr_pdf_with_key`]) so no key ever lives in shared state.

use crate::backend::OcrBackend;
use crate::error::PdfOcrError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// OpenAI-compatible endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Vision model used when no model is configured.
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

/// Configuration for an OCR run.
///
/// Built via [`OcrConfig::builder()`] or using [`OcrConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_ocr::{OcrConfig, RasterFormat};
///
/// let config = OcrConfig::builder()
///     .dpi(600)
///     .format(RasterFormat::Jpeg)
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 600);
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Rasterisation resolution in dots per inch. Default: 300.
    ///
    /// Higher values make small print legible to the model at the price of
    /// render time and request size. Output raster size follows the page
    /// size: `points × dpi / 72` on each axis.
    pub dpi: u32,

    /// Format the rasteriser stages pages in. Default: [`RasterFormat::Png`].
    ///
    /// Whatever is staged, the page is re-encoded as PNG for transport.
    pub format: RasterFormat,

    /// Vision model identifier sent with every request.
    pub model: String,

    /// Base URL of the OpenAI-compatible chat-completions API.
    pub base_url: String,

    /// Named `edgequake-llm` provider (e.g. "openai", "anthropic", "ollama").
    ///
    /// When set, requests go through that provider instead of the
    /// OpenRouter endpoint, and the provider reads its own key variable.
    pub provider_name: Option<String>,

    /// Pre-constructed backend. Takes precedence over everything else.
    pub backend: Option<Arc<dyn OcrBackend>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Kept at the low end of the range so transcription is as close to
    /// deterministic as the service allows.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Number of pages in flight at once. Default: 1 (strictly sequential).
    ///
    /// Results are always returned in page order, whatever the value.
    pub concurrency: usize,

    /// Per-page OCR call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Keep the verbatim service response in each page record. Default: true.
    ///
    /// When false, `raw_response` is written as an empty string so the
    /// artifact keeps its shape but shrinks considerably.
    pub include_raw_response: bool,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            format: RasterFormat::default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            provider_name: None,
            backend: None,
            temperature: 0.1,
            max_tokens: 4096,
            concurrency: 1,
            api_timeout_secs: 120,
            password: None,
            include_raw_response: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("dpi", &self.dpi)
            .field("format", &self.format)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("concurrency", &self.concurrency)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("include_raw_response", &self.include_raw_response)
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn format(mut self, format: RasterFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn include_raw_response(mut self, v: bool) -> Self {
        self.config.include_raw_response = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, PdfOcrError> {
        let c = &self.config;
        if c.dpi == 0 || c.dpi > MAX_DPI {
            return Err(PdfOcrError::InvalidConfig(format!(
                "DPI must be 1–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if c.max_tokens == 0 {
            return Err(PdfOcrError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(PdfOcrError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(PdfOcrError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// Upper DPI bound; an A4 page at 2400 DPI is already ~20k × 28k pixels.
pub const MAX_DPI: u32 = 2400;

// ── Enums ────────────────────────────────────────────────────────────────

/// Image format the rasteriser stages each page in.
///
/// PNG is lossless and the default. JPEG trades fidelity for smaller staging
/// files; TIFF is accepted for parity with scanner workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    /// Lossless (default).
    #[default]
    Png,
    /// Lossy.
    Jpeg,
    /// Lossless, uncompressed.
    Tiff,
}

impl RasterFormat {
    /// File extension used for staged pages.
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Tiff => "tiff",
        }
    }

    /// The matching `image` crate format.
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            RasterFormat::Png => image::ImageFormat::Png,
            RasterFormat::Jpeg => image::ImageFormat::Jpeg,
            RasterFormat::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpeg",
            RasterFormat::Tiff => "tiff",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ocr_contract() {
        let c = OcrConfig::default();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.format, RasterFormat::Png);
        assert_eq!(c.model, "google/gemini-2.0-flash-001");
        assert_eq!(c.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.concurrency, 1);
        assert!(c.include_raw_response);
    }

    #[test]
    fn builder_rejects_zero_dpi() {
        let err = OcrConfig::builder().dpi(0).build().unwrap_err();
        assert!(matches!(err, PdfOcrError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_absurd_dpi() {
        assert!(OcrConfig::builder().dpi(MAX_DPI + 1).build().is_err());
        assert!(OcrConfig::builder().dpi(MAX_DPI).build().is_ok());
    }

    #[test]
    fn builder_clamps_concurrency_and_temperature() {
        let c = OcrConfig::builder()
            .concurrency(0)
            .temperature(9.0)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_redacts_password() {
        let c = OcrConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn raster_format_properties() {
        assert_eq!(RasterFormat::Jpeg.extension(), "jpg");
        assert_eq!(RasterFormat::Tiff.image_format(), image::ImageFormat::Tiff);
        assert_eq!(RasterFormat::Jpeg.to_string(), "jpeg");
    }
}
