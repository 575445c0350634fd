//! Pipeline stages for tax-form field extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets us swap an
//! implementation (a different OCR engine, another completion endpoint)
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ llm
//! (path)   (pdfium)  (tesseract) (completion service)
//! ```
//!
//! 1. [`input`]  — validate the PDF path and magic bytes
//! 2. [`render`] — rasterize every page at 300 DPI; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`ocr`]    — recognize each page image as plain text; also blocking
//! 4. [`llm`]    — the completion-client seam and JSON-span isolation; the
//!    only stage with network I/O

pub mod input;
pub mod llm;
pub mod ocr;
pub mod render;
