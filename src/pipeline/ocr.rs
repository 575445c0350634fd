//! Text recognition via Tesseract (`leptess`).
//!
//! Pages are recognized with PSM 6 ("assume a single uniform block of text")
//! by default, which fits printed forms far better than automatic layout
//! analysis — form boxes otherwise get re-ordered into nonsense.
//!
//! Tesseract handles are not `Send`, so recognition runs entirely inside one
//! `spawn_blocking` task that creates the engine, feeds it every page in
//! document order, and returns the per-page texts. There are no internal
//! retries; a recognizer failure surfaces as [`TaxdocError::Ocr`] and the
//! caller decides whether to retry the whole call.

use crate::config::ExtractionConfig;
use crate::error::TaxdocError;
use image::DynamicImage;
use leptess::{LepTess, Variable};
use tracing::debug;

/// Recognize text on every page image, in order.
///
/// Returns one whitespace-trimmed text block per page.
pub async fn recognize_pages(
    images: Vec<DynamicImage>,
    config: &ExtractionConfig,
) -> Result<Vec<String>, TaxdocError> {
    let language = config.ocr_language.clone();
    let psm = config.ocr_psm;

    tokio::task::spawn_blocking(move || recognize_pages_blocking(images, &language, psm))
        .await
        .map_err(|e| TaxdocError::Internal(format!("OCR task panicked: {e}")))?
}

/// Blocking implementation: one engine instance, reused across pages.
fn recognize_pages_blocking(
    images: Vec<DynamicImage>,
    language: &str,
    psm: u32,
) -> Result<Vec<String>, TaxdocError> {
    let mut engine = LepTess::new(None, language).map_err(|e| TaxdocError::Ocr {
        page: 0,
        detail: format!(
            "failed to initialize Tesseract with language '{language}': {e}. \
             Make sure the language data is installed."
        ),
    })?;

    engine
        .set_variable(Variable::TesseditPagesegMode, &psm.to_string())
        .map_err(|e| TaxdocError::Ocr {
            page: 0,
            detail: format!("failed to set page segmentation mode {psm}: {e}"),
        })?;

    let mut texts = Vec::with_capacity(images.len());
    for (idx, image) in images.into_iter().enumerate() {
        let page = idx + 1;
        let text = recognize_one(&mut engine, &image, page)?;
        debug!("Recognized page {}: {} chars", page, text.len());
        texts.push(text);
    }

    Ok(texts)
}

/// Recognize a single page image.
fn recognize_one(
    engine: &mut LepTess,
    image: &DynamicImage,
    page: usize,
) -> Result<String, TaxdocError> {
    // leptess expects encoded image data, so hand it an in-memory PNG.
    let mut png_buf = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut png_buf, image::ImageFormat::Png)
        .map_err(|e| TaxdocError::Ocr {
            page,
            detail: format!("failed to encode page image to PNG: {e}"),
        })?;

    engine
        .set_image_from_mem(png_buf.get_ref())
        .map_err(|e| TaxdocError::Ocr {
            page,
            detail: format!("failed to load page image: {e}"),
        })?;

    let text = engine.get_utf8_text().map_err(|e| TaxdocError::Ocr {
        page,
        detail: format!("recognition failed: {e}"),
    })?;

    Ok(text.trim().to_string())
}
