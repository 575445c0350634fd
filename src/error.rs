//! Error types for the taxdoc-extract library.
//!
//! Every pipeline stage fails fast: there are no partial results and no
//! internal retries. The orchestration layer in [`crate::extract`] wraps the
//! first stage failure in [`TaxdocError::ExtractionFailed`] (or
//! [`TaxdocError::AdviceFailed`]) carrying a [`Stage`] tag and the original
//! cause, so callers can tell *where* a call died without string-matching
//! error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The pipeline stage at which an extraction or advice call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// PDF → page images.
    Rasterize,
    /// Page image → recognized text.
    Recognize,
    /// Prompt → parsed model response.
    Extract,
    /// Parsed response → validated, re-scored result.
    Validate,
    /// Field map → advice response.
    Advise,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Rasterize => "rasterize",
            Stage::Recognize => "recognize",
            Stage::Extract => "extract",
            Stage::Validate => "validate",
            Stage::Advise => "advise",
        };
        f.write_str(name)
    }
}

/// All errors returned by the taxdoc-extract library.
#[derive(Debug, Error)]
pub enum TaxdocError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Rasterization errors ──────────────────────────────────────────────
    /// pdfium could not open or render the document.
    #[error("Failed to convert PDF '{path}' to page images: {detail}")]
    PdfConversion { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// Tesseract failed on a page image.
    #[error("OCR failed on page {page}: {detail}")]
    Ocr { page: usize, detail: String },

    // ── Completion-service errors ─────────────────────────────────────────
    /// The remote completion call itself failed (network, auth, quota).
    #[error("Completion service call failed: {detail}")]
    LlmCall { detail: String },

    /// The model response contained no `{...}` span at all.
    #[error("No JSON object found in model response: {snippet:?}")]
    NoJsonFound { snippet: String },

    /// The isolated `{...}` span was not valid JSON.
    #[error("Failed to parse model response as JSON: {detail}")]
    JsonParse { detail: String },

    /// A parsed field did not match the `{value, confidence}` shape.
    #[error("Model response field '{field}' does not match the expected shape: {detail}")]
    SchemaMismatch { field: String, detail: String },

    // ── Aggregates ────────────────────────────────────────────────────────
    /// Field extraction aborted; `stage` names where and `source` says why.
    #[error("Field extraction failed at stage '{stage}'")]
    ExtractionFailed {
        stage: Stage,
        #[source]
        source: Box<TaxdocError>,
    },

    /// Advice generation aborted.
    #[error("Tax advice generation failed at stage '{stage}'")]
    AdviceFailed {
        stage: Stage,
        #[source]
        source: Box<TaxdocError>,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TaxdocError {
    /// Wrap a stage failure into [`TaxdocError::ExtractionFailed`].
    pub(crate) fn at_stage(stage: Stage, source: TaxdocError) -> Self {
        TaxdocError::ExtractionFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// Wrap a stage failure into [`TaxdocError::AdviceFailed`].
    pub(crate) fn advice_at_stage(stage: Stage, source: TaxdocError) -> Self {
        TaxdocError::AdviceFailed {
            stage,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failed_display_names_stage() {
        let e = TaxdocError::at_stage(
            Stage::Recognize,
            TaxdocError::Ocr {
                page: 2,
                detail: "engine init failed".into(),
            },
        );
        assert!(e.to_string().contains("recognize"), "got: {e}");
    }

    #[test]
    fn extraction_failed_preserves_source() {
        use std::error::Error as _;
        let e = TaxdocError::at_stage(
            Stage::Extract,
            TaxdocError::NoJsonFound {
                snippet: "sorry, I can't".into(),
            },
        );
        let source = e.source().expect("source must be preserved");
        assert!(source.to_string().contains("No JSON object"));
    }

    #[test]
    fn advice_failed_display() {
        let e = TaxdocError::advice_at_stage(
            Stage::Advise,
            TaxdocError::LlmCall {
                detail: "HTTP 429".into(),
            },
        );
        let msg = e.to_string();
        assert!(msg.contains("advice"), "got: {msg}");
        assert!(msg.contains("advise"), "got: {msg}");
    }

    #[test]
    fn no_json_found_display_includes_snippet() {
        let e = TaxdocError::NoJsonFound {
            snippet: "plain prose".into(),
        };
        assert!(e.to_string().contains("plain prose"));
    }
}
