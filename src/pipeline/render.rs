//! PDF rasterization: render every page to a `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking thread
//! pool so Tokio worker threads never stall during CPU-heavy rendering.
//!
//! ## DPI and the pixel cap
//!
//! Pages are rendered at the configured DPI (default 300 — OCR accuracy on
//! printed forms degrades sharply below ~200). `max_rendered_pixels`
//! additionally caps the longest edge so an oversized custom page cannot
//! exhaust memory regardless of DPI.

use crate::config::ExtractionConfig;
use crate::error::TaxdocError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Points per inch in PDF page geometry.
const POINTS_PER_INCH: f32 = 72.0;

/// Rasterize every page of a PDF into an ordered sequence of images.
///
/// Page order in the returned vector is document order; the caller's
/// evidence-text concatenation depends on it.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<Vec<DynamicImage>, TaxdocError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;

    tokio::task::spawn_blocking(move || render_pages_blocking(&path, dpi, max_pixels))
        .await
        .map_err(|e| TaxdocError::Internal(format!("Render task panicked: {e}")))?
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, TaxdocError> {
    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| TaxdocError::PdfConversion {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut images = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        // Scale page width from points to pixels at the requested DPI,
        // bounded by the pixel cap.
        let width_px = (page.width().value / POINTS_PER_INCH * dpi as f32).round() as i32;
        let target_width = width_px.clamp(1, max_pixels as i32);

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_maximum_height(max_pixels as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            TaxdocError::PdfConversion {
                path: pdf_path.to_path_buf(),
                detail: format!("page {}: {e:?}", idx + 1),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    Ok(images)
}
