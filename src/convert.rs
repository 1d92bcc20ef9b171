//! Top-level OCR entry points.
//!
//! Every entry point checks its preconditions in the same order: backend
//! (credential) first, then the input file, then rasterisation. Any of these
//! failing is fatal and happens before the first OCR request. Once pages are
//! rasterised the run always yields a full [`OcrDocument`].

use crate::backend::resolve_backend;
use crate::config::OcrConfig;
use crate::error::PdfOcrError;
use crate::output::{DocumentInfo, OcrDocument};
use crate::pipeline::input;
use crate::pipeline::render::{self, RenderOptions};
use crate::processor::PageProcessor;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// OCR a PDF using the backend on `config` (pre-built or named provider).
///
/// Use [`ocr_pdf_with_key`] for the default OpenRouter backend.
pub async fn ocr_pdf(
    input: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<OcrDocument, PdfOcrError> {
    ocr_pdf_with_key(input, None, config).await
}

/// OCR a PDF, one page per request.
///
/// `api_key` is the OpenRouter credential; it is ignored when `config`
/// carries a backend or provider name.
///
/// # Returns
/// `Ok(OcrDocument)` with one entry per page, even if some pages failed
/// (check [`OcrDocument::failed_pages`]).
///
/// # Errors
/// Returns `Err(PdfOcrError)` only for fatal errors:
/// - no API key / backend cannot be created
/// - file not found, unreadable, or not a PDF
/// - corrupt, encrypted or empty PDF; a page that cannot be rasterised
pub async fn ocr_pdf_with_key(
    input: impl AsRef<Path>,
    api_key: Option<&str>,
    config: &OcrConfig,
) -> Result<OcrDocument, PdfOcrError> {
    let total_start = Instant::now();

    let backend = resolve_backend(config, api_key)?;
    let pdf_path = input::resolve_input(input.as_ref())?;
    info!(
        "Starting OCR: {} via {} ({})",
        pdf_path.display(),
        backend.name(),
        config.model
    );

    let render_start = Instant::now();
    let rasterized = render::render_document(&pdf_path, &RenderOptions::from(config)).await?;
    info!(
        "Rendered {} pages in {}ms",
        rasterized.len(),
        render_start.elapsed().as_millis()
    );

    let processor = PageProcessor::new(backend, config);
    let document = processor.process_document(&rasterized).await;

    info!(
        "Run complete: {}/{} pages, {}ms total",
        document.success_count(),
        document.len(),
        total_start.elapsed().as_millis()
    );
    Ok(document)
}

/// OCR a PDF and write the JSON artifact to `output_path`.
///
/// The document is returned as well so callers can report on it.
pub async fn ocr_pdf_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    api_key: Option<&str>,
    config: &OcrConfig,
) -> Result<OcrDocument, PdfOcrError> {
    let document = ocr_pdf_with_key(input, api_key, config).await?;
    document.write_json(output_path.as_ref()).await?;
    info!("Saved OCR result to {}", output_path.as_ref().display());
    Ok(document)
}

/// Synchronous wrapper around [`ocr_pdf_with_key`].
///
/// Creates a temporary tokio runtime internally.
pub fn ocr_pdf_sync(
    input: impl AsRef<Path>,
    api_key: Option<&str>,
    config: &OcrConfig,
) -> Result<OcrDocument, PdfOcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfOcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(ocr_pdf_with_key(input, api_key, config))
}

/// Read page count and PDF version without OCR.
///
/// Does not require a backend or API key.
pub async fn inspect(
    input: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentInfo, PdfOcrError> {
    let pdf_path = input::resolve_input(input.as_ref())?;
    render::inspect_document(&pdf_path, password).await
}
