//! Input validation: confirm the supplied path is a readable PDF.
//!
//! pdfium reports corrupt files with opaque internal codes, so we validate
//! the `%PDF` magic bytes up front and hand callers a meaningful error
//! instead of a rasterization failure on a file that was never a PDF.

use crate::error::TaxdocError;
use std::path::PathBuf;
use tracing::debug;

/// Validate that `path` points at a readable PDF file.
///
/// Returns the canonicalized path on success.
pub fn resolve_pdf(path_str: &str) -> Result<PathBuf, TaxdocError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(TaxdocError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(TaxdocError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TaxdocError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(TaxdocError::FileNotFound { path });
        }
    }

    debug!("Resolved PDF: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_file_not_found() {
        let err = resolve_pdf("/definitely/not/a/real/file.pdf").unwrap_err();
        assert!(matches!(err, TaxdocError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_magic_is_rejected() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"PK\x03\x04 this is a zip").unwrap();

        let err = resolve_pdf(&tmp.path().to_string_lossy()).unwrap_err();
        match err {
            TaxdocError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\n%stub").unwrap();

        let path = resolve_pdf(&tmp.path().to_string_lossy()).unwrap();
        assert_eq!(path, tmp.path());
    }
}
