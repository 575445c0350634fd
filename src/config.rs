//! Configuration for extraction and advice calls.
//!
//! Every knob lives in [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping the knobs in one struct makes configs
//! trivial to share across calls and to diff when two runs disagree.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::TaxdocError;
use crate::pipeline::llm::CompletionClient;
use std::fmt;
use std::sync::Arc;

/// Configuration for field extraction and tax advice.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use taxdoc_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .dpi(300)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering DPI for page rasterization. Range: 72–600. Default: 300.
    ///
    /// 300 DPI is the Tesseract sweet spot for printed forms: below ~200 the
    /// small box labels on W-2s smear together; above ~400 processing time
    /// grows with no accuracy gain.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// A safety cap independent of DPI so an oversized page cannot exhaust
    /// memory. Either dimension is capped, scaling the other proportionally.
    pub max_rendered_pixels: u32,

    /// Tesseract language code(s), e.g. "eng" or "eng+spa". Default: "eng".
    pub ocr_language: String,

    /// Tesseract page segmentation mode. Default: 6.
    ///
    /// PSM 6 assumes a single uniform block of text, which fits printed tax
    /// forms far better than full automatic layout analysis.
    pub ocr_psm: u32,

    /// Completion model identifier. Default: "gpt-4o-mini".
    pub model: String,

    /// Sampling temperature for field extraction. Default: 0.1.
    ///
    /// Low temperature keeps the model deterministic and faithful to the OCR
    /// text — exactly what structured extraction wants.
    pub extraction_temperature: f32,

    /// Sampling temperature for tax advice. Default: 0.3.
    ///
    /// Slightly higher than extraction: advice prose benefits from variety,
    /// and there is no ground truth to stay faithful to.
    pub advice_temperature: f32,

    /// Maximum tokens for an extraction response. Default: 1000.
    pub extraction_max_tokens: u32,

    /// Maximum tokens for an advice response. Default: 1500.
    ///
    /// Advice responses carry several list sections and run longer than a
    /// field map; too small a budget truncates the JSON mid-object.
    pub advice_max_tokens: u32,

    /// Per-completion-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Pre-constructed completion client. Default: none.
    ///
    /// When unset, calls construct an OpenAI client from `OPENAI_API_KEY` at
    /// first use. Inject a client here to point at a different endpoint or to
    /// substitute a fake in tests.
    pub client: Option<Arc<dyn CompletionClient>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 4000,
            ocr_language: "eng".to_string(),
            ocr_psm: 6,
            model: "gpt-4o-mini".to_string(),
            extraction_temperature: 0.1,
            advice_temperature: 0.3,
            extraction_max_tokens: 1000,
            advice_max_tokens: 1500,
            api_timeout_secs: 60,
            client: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_psm", &self.ocr_psm)
            .field("model", &self.model)
            .field("extraction_temperature", &self.extraction_temperature)
            .field("advice_temperature", &self.advice_temperature)
            .field("extraction_max_tokens", &self.extraction_max_tokens)
            .field("advice_max_tokens", &self.advice_max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("client", &self.client.as_ref().map(|_| "<dyn CompletionClient>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_psm(mut self, psm: u32) -> Self {
        self.config.ocr_psm = psm;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn extraction_temperature(mut self, t: f32) -> Self {
        self.config.extraction_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn advice_temperature(mut self, t: f32) -> Self {
        self.config.advice_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn extraction_max_tokens(mut self, n: u32) -> Self {
        self.config.extraction_max_tokens = n;
        self
    }

    pub fn advice_max_tokens(mut self, n: u32) -> Self {
        self.config.advice_max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, TaxdocError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(TaxdocError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.ocr_language.is_empty() {
            return Err(TaxdocError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.extraction_max_tokens == 0 || c.advice_max_tokens == 0 {
            return Err(TaxdocError::InvalidConfig(
                "Token budgets must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.ocr_psm, 6);
        assert_eq!(c.extraction_temperature, 0.1);
        assert_eq!(c.advice_temperature, 0.3);
        assert_eq!(c.extraction_max_tokens, 1000);
        assert_eq!(c.advice_max_tokens, 1500);
        assert!(c.client.is_none());
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = ExtractionConfig::builder().dpi(10_000).build().unwrap();
        assert_eq!(c.dpi, 600);
        let c = ExtractionConfig::builder().dpi(1).build().unwrap();
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn builder_rejects_empty_language() {
        let result = ExtractionConfig::builder().ocr_language("").build();
        assert!(matches!(result, Err(TaxdocError::InvalidConfig(_))));
    }

    #[test]
    fn debug_hides_client_internals() {
        let repr = format!("{:?}", ExtractionConfig::default());
        assert!(repr.contains("ExtractionConfig"));
        assert!(repr.contains("client: None"));
    }
}
