//! Error types for the pdf-ocr library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PdfOcrError`] is **fatal**: the run cannot proceed at all (no API key,
//!   bad input file, PDF engine missing, unwritable output). Returned as
//!   `Err(PdfOcrError)` from the top-level `ocr_*` functions.
//!
//! * [`PageError`] is **non-fatal**: a single page failed (transient network
//!   error, HTTP 5xx, malformed response) but all other pages are fine.
//!   Stored inside [`crate::output::PageResult`] so the document is always
//!   emitted once rasterisation succeeds.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-ocr library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PdfOcrError {
    // ── Credential errors ─────────────────────────────────────────────────
    /// No API key was supplied for the OCR service.
    #[error(
        "No API key for the OCR service.\n\
Pass it with --api-key <KEY> or set OPENROUTER_API_KEY in the environment or a .env file."
    )]
    MissingApiKey,

    /// A named provider could not be constructed (missing key, unknown name …).
    #[error("OCR backend '{backend}' is not configured.\n{hint}")]
    BackendNotConfigured { backend: String, hint: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The PDF parsed but contains no pages.
    #[error("PDF '{path}' has no pages; nothing to OCR")]
    EmptyDocument { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be written to (or read back from) the
    /// run's staging directory.
    #[error("Failed to stage page {page} image: {detail}")]
    StagingFailed { page: usize, detail: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF rasterisation needs the pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n\
  • Place libpdfium next to the working directory.\n\
  • Install it system-wide (prebuilt: https://github.com/bblanchon/pdfium-binaries).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The result document could not be serialised or parsed as JSON.
    #[error("JSON serialisation failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::OcrDocument::into_result`] when the
    /// caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed OCR (pages: {pages:?})")]
    PartialFailure {
        failed: usize,
        total: usize,
        pages: Vec<usize>,
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

/// A non-fatal error for a single page.
///
/// Recorded in [`crate::output::PageResult::error`]; the run moves on to the
/// next page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageError {
    /// The staged page image could not be loaded or PNG-encoded.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The request never produced an HTTP response (DNS, TLS, connection reset …).
    #[error("Page {page}: request failed: {detail}")]
    Request { page: usize, detail: String },

    /// The service answered with a non-success status.
    #[error("Page {page}: OCR service returned HTTP {status}: {body}")]
    Service { page: usize, status: u16, body: String },

    /// The service answered 2xx but the body lacked the expected text field.
    #[error("Page {page}: malformed OCR response: {detail}")]
    MalformedResponse { page: usize, detail: String },

    /// The call did not finish within the configured timeout.
    #[error("Page {page}: OCR call timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },
}
