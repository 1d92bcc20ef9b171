//! Input validation: make sure the user-supplied path is a readable PDF.
//!
//! Checking the `%PDF` header here gives callers a precise error (and costs
//! no OCR call) instead of a generic pdfium load failure further down.

use crate::error::PdfOcrError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// PDF readers accept the header anywhere in the first kilobyte.
const HEADER_WINDOW: usize = 1024;

/// Validate that `path` exists, is readable and looks like a PDF.
///
/// Returns the path unchanged on success.
pub fn resolve_input(path: &Path) -> Result<PathBuf, PdfOcrError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(PdfOcrError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PdfOcrError::PermissionDenied { path });
        }
        Err(_) => return Err(PdfOcrError::FileNotFound { path }),
    };

    let mut head = Vec::with_capacity(HEADER_WINDOW);
    file.by_ref()
        .take(HEADER_WINDOW as u64)
        .read_to_end(&mut head)
        .map_err(|_| PdfOcrError::PermissionDenied { path: path.clone() })?;

    if !has_pdf_header(&head) {
        let magic = head.iter().take(8).copied().collect();
        return Err(PdfOcrError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

fn has_pdf_header(head: &[u8]) -> bool {
    head.windows(4).any(|w| w == b"%PDF")
}
