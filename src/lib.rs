//! # taxdoc-extract
//!
//! Extract structured tax-form fields from scanned PDF documents and turn
//! them into human-readable tax advice.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Render      rasterize pages at 300 DPI via pdfium (spawn_blocking)
//!  ├─ 2. Recognize   Tesseract OCR per page, concatenated with page markers
//!  ├─ 3. Extract     structured-generation call against the form schema
//!  ├─ 4. Validate    model JSON checked against the schema's key set
//!  └─ 5. Re-score    confidences recomputed from the recognized text
//! ```
//!
//! A parallel advice pipeline ([`get_tax_advice`]) consumes the extracted
//! field map instead of raw text and targets a tax-advice JSON shape.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taxdoc_extract::{extract_fields, get_tax_advice, ExtractionConfig, FormType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Completion credential read from OPENAI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let fields = extract_fields("w2_scan.pdf", FormType::W2, &config).await?;
//!     for (name, field) in &fields {
//!         println!("{name}: {} ({:.0}%)", field.value, field.confidence * 100.0);
//!     }
//!     let advice = get_tax_advice(&fields, FormType::W2, &config).await?;
//!     println!("{}", advice.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `taxdoc` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! taxdoc-extract = { version = "0.3", default-features = false }
//! ```
//!
//! ## Confidence scores
//!
//! The model reports a confidence per field, but that number is not grounded
//! in what the OCR saw. The pipeline discards it and recomputes confidence
//! from the recognized text (see [`confidence::calculate_confidence_score`]),
//! so a `0.8+` score means the value literally appears on the page.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod confidence;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{Stage, TaxdocError};
pub use extract::{
    extract_fields, extract_fields_sync, get_tax_advice, get_tax_advice_sync, recognize,
};
pub use output::{AdviceResult, ExtractedField, ExtractionResult, DEFAULT_DISCLAIMER, NOT_FOUND};
pub use pipeline::llm::{CompletionClient, CompletionRequest, OpenAiClient};
pub use schema::{FieldSpec, FormSchema, FormType};
