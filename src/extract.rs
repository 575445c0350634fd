//! Orchestration: the extraction and advice pipelines end to end.
//!
//! [`extract_fields`] runs one linear, sequential pipeline: rasterize →
//! recognize per page → build prompt → structured extraction → validate →
//! re-score confidences. Pages are processed in document order because the
//! evidence text's page ordering is part of the contract. Any stage failure
//! aborts the whole call, wrapped with the stage that died (see
//! [`crate::error`]).
//!
//! Each call is independent and stateless — no cross-call caches, no shared
//! mutable state — so concurrent callers need no locking.

use crate::config::ExtractionConfig;
use crate::confidence::calculate_confidence_score;
use crate::error::{Stage, TaxdocError};
use crate::output::{AdviceResult, ExtractionResult};
use crate::pipeline::llm::{self, CompletionClient, CompletionRequest, OpenAiClient};
use crate::pipeline::{input, ocr, render};
use crate::prompts::{self, ADVICE_SYSTEM_PROMPT, EXTRACTION_SYSTEM_PROMPT};
use crate::schema::FormType;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract structured fields from a scanned tax-form PDF.
///
/// # Arguments
/// * `pdf_path`  — path to a local PDF file
/// * `form_type` — which field schema to extract
/// * `config`    — pipeline configuration
///
/// # Errors
/// Returns [`TaxdocError::ExtractionFailed`] wrapping the first stage
/// failure: a bad PDF, an OCR failure, a completion-call failure, or a
/// malformed model response.
pub async fn extract_fields(
    pdf_path: impl AsRef<str>,
    form_type: FormType,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, TaxdocError> {
    let total_start = Instant::now();
    let pdf_path = pdf_path.as_ref();
    info!("Starting {} field extraction: {}", form_type, pdf_path);

    // ── Stage 1: Rasterize ───────────────────────────────────────────────
    let path = input::resolve_pdf(pdf_path).map_err(|e| TaxdocError::at_stage(Stage::Rasterize, e))?;

    let render_start = Instant::now();
    let images = render::render_pages(&path, config)
        .await
        .map_err(|e| TaxdocError::at_stage(Stage::Rasterize, e))?;
    info!(
        "Rendered {} pages in {}ms",
        images.len(),
        render_start.elapsed().as_millis()
    );

    // ── Stage 2: Recognize ───────────────────────────────────────────────
    let ocr_start = Instant::now();
    let page_texts = ocr::recognize_pages(images, config)
        .await
        .map_err(|e| TaxdocError::at_stage(Stage::Recognize, e))?;
    let evidence_text = concat_with_page_markers(&page_texts);
    info!(
        "Recognized {} pages ({} chars) in {}ms",
        page_texts.len(),
        evidence_text.len(),
        ocr_start.elapsed().as_millis()
    );

    // ── Stage 3: Structured extraction ───────────────────────────────────
    let schema = form_type.schema();
    let request = CompletionRequest {
        system: EXTRACTION_SYSTEM_PROMPT.to_string(),
        prompt: prompts::extraction_prompt(schema, &evidence_text),
        temperature: config.extraction_temperature,
        max_tokens: config.extraction_max_tokens,
    };

    let client = resolve_client(config);
    let llm_start = Instant::now();
    let response = llm::request_json(client.as_ref(), &request)
        .await
        .map_err(|e| TaxdocError::at_stage(Stage::Extract, e))?;
    debug!("Completion call took {}ms", llm_start.elapsed().as_millis());

    // ── Stage 4: Validate and re-score ───────────────────────────────────
    let mut result = ExtractionResult::from_model_response(response, schema)
        .map_err(|e| TaxdocError::at_stage(Stage::Validate, e))?;

    // The model's self-reported confidence is not grounded in the OCR text;
    // replace it wholesale.
    result.rescore_with(|value| calculate_confidence_score(value, &evidence_text));

    info!(
        "Extraction complete: {} fields, {}ms total",
        result.len(),
        total_start.elapsed().as_millis()
    );
    Ok(result)
}

/// Generate tax advice from previously extracted fields.
///
/// # Errors
/// Returns [`TaxdocError::AdviceFailed`] wrapping a completion-call failure
/// or a malformed model response.
pub async fn get_tax_advice(
    extracted: &ExtractionResult,
    form_type: FormType,
    config: &ExtractionConfig,
) -> Result<AdviceResult, TaxdocError> {
    let start = Instant::now();
    info!("Generating {} tax advice", form_type);

    let schema = form_type.schema();
    let request = CompletionRequest {
        system: ADVICE_SYSTEM_PROMPT.to_string(),
        prompt: prompts::advice_prompt(schema, extracted),
        temperature: config.advice_temperature,
        max_tokens: config.advice_max_tokens,
    };

    let client = resolve_client(config);
    let response = llm::request_json(client.as_ref(), &request)
        .await
        .map_err(|e| TaxdocError::advice_at_stage(Stage::Advise, e))?;

    let advice = AdviceResult::from_model_response(response)
        .map_err(|e| TaxdocError::advice_at_stage(Stage::Validate, e))?;

    info!("Advice complete in {}ms", start.elapsed().as_millis());
    Ok(advice)
}

/// Run only the rasterize + recognize stages and return the evidence text.
///
/// Useful for debugging OCR quality without an API credential, and as the
/// CLI's `recognize` subcommand.
pub async fn recognize(
    pdf_path: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<String, TaxdocError> {
    let path = input::resolve_pdf(pdf_path.as_ref())
        .map_err(|e| TaxdocError::at_stage(Stage::Rasterize, e))?;
    let images = render::render_pages(&path, config)
        .await
        .map_err(|e| TaxdocError::at_stage(Stage::Rasterize, e))?;
    let page_texts = ocr::recognize_pages(images, config)
        .await
        .map_err(|e| TaxdocError::at_stage(Stage::Recognize, e))?;
    Ok(concat_with_page_markers(&page_texts))
}

/// Synchronous wrapper around [`extract_fields`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_fields_sync(
    pdf_path: impl AsRef<str>,
    form_type: FormType,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, TaxdocError> {
    runtime()?.block_on(extract_fields(pdf_path, form_type, config))
}

/// Synchronous wrapper around [`get_tax_advice`].
pub fn get_tax_advice_sync(
    extracted: &ExtractionResult,
    form_type: FormType,
    config: &ExtractionConfig,
) -> Result<AdviceResult, TaxdocError> {
    runtime()?.block_on(get_tax_advice(extracted, form_type, config))
}

fn runtime() -> Result<tokio::runtime::Runtime, TaxdocError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TaxdocError::Internal(format!("Failed to create tokio runtime: {e}")))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the completion client: the injected one, else OpenAI from the
/// environment.
///
/// The environment fallback does not check that `OPENAI_API_KEY` is actually
/// set — an absent credential surfaces as `LlmCall` on first use rather than
/// as an up-front configuration error.
fn resolve_client(config: &ExtractionConfig) -> Arc<dyn CompletionClient> {
    match &config.client {
        Some(client) => Arc::clone(client),
        None => Arc::new(OpenAiClient::from_env(&config.model, config.api_timeout_secs)),
    }
}

/// Concatenate per-page texts into the evidence string, page markers first.
fn concat_with_page_markers(page_texts: &[String]) -> String {
    let mut evidence = String::new();
    for (idx, text) in page_texts.iter().enumerate() {
        evidence.push_str(&format!("\n--- Page {} ---\n{}\n", idx + 1, text));
    }
    evidence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescoring_overrides_model_reported_confidence() {
        let evidence = "\n--- Page 1 ---\nEmployer: Acme Corp\nWages: $52,000.00\n";
        let response = serde_json::json!({
            "employer": {"value": "Acme Corp", "confidence": 0.2},
        });

        let mut result =
            ExtractionResult::from_model_response(response, FormType::W2.schema()).unwrap();
        result.rescore_with(|value| calculate_confidence_score(value, evidence));

        // Verbatim substring of the evidence: ≥ 0.8 regardless of what the
        // model claimed.
        let employer = result.get("employer").unwrap();
        assert!(employer.confidence >= 0.8, "got {}", employer.confidence);
        // Sentinel-filled fields stay at zero.
        assert_eq!(result.get("wages").unwrap().confidence, 0.0);
    }

    #[test]
    fn page_markers_preserve_order() {
        let evidence = concat_with_page_markers(&[
            "first page".to_string(),
            "second page".to_string(),
        ]);
        let p1 = evidence.find("--- Page 1 ---").unwrap();
        let p2 = evidence.find("--- Page 2 ---").unwrap();
        assert!(p1 < p2);
        assert!(evidence.contains("\n--- Page 1 ---\nfirst page\n"));
        assert!(evidence.contains("\n--- Page 2 ---\nsecond page\n"));
    }

    #[test]
    fn no_pages_yields_empty_evidence() {
        assert_eq!(concat_with_page_markers(&[]), "");
    }

    #[test]
    fn resolve_client_prefers_injected() {
        use crate::pipeline::llm::CompletionRequest;
        use async_trait::async_trait;

        struct Canned;
        #[async_trait]
        impl CompletionClient for Canned {
            async fn complete(&self, _request: &CompletionRequest) -> Result<String, TaxdocError> {
                Ok("{}".to_string())
            }
        }

        let injected: Arc<dyn CompletionClient> = Arc::new(Canned);
        let config = ExtractionConfig {
            client: Some(Arc::clone(&injected)),
            ..Default::default()
        };
        let resolved = resolve_client(&config);
        assert!(Arc::ptr_eq(&resolved, &injected));
    }
}
