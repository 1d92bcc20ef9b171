//! # pdf-ocr
//!
//! Transcribe scanned or image-only PDFs page by page with a Vision Language
//! Model, keeping the text exactly as it appears on the page.
//!
//! ## Why this crate?
//!
//! Text-layer extraction returns nothing for scans, and classic OCR engines
//! lose columns, tables and formulae. Here every page is rasterised and sent
//! to a VLM with a strict "transcribe verbatim, keep the layout" instruction.
//! The result is a JSON document with one entry per page; a page whose call
//! fails is marked as failed instead of stopping the run, so a long scan is
//! never lost to one transient error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    check the file exists and starts with %PDF
//!  ├─ 2. Render   rasterise pages via pdfium (spawn_blocking) into a temp dir
//!  ├─ 3. Encode   staged image → PNG → base64 data URL
//!  ├─ 4. OCR      one chat-completions call per page, bounded by a timeout
//!  └─ 5. Output   {"pages":[{"index","text","raw_response"}]} → <stem>_ocr.json
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_ocr::{ocr_pdf_to_file, default_output_path, OcrConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = std::env::var("OPENROUTER_API_KEY")?;
//!     let input = Path::new("scan.pdf");
//!     let config = OcrConfig::default();
//!     let doc = ocr_pdf_to_file(input, default_output_path(input), Some(key.as_str()), &config).await?;
//!     eprintln!("{}/{} pages transcribed", doc.success_count(), doc.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-ocr` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf-ocr = { version = "0.1", default-features = false }
//! ```
//!
//! ## Backends
//!
//! The default backend posts to OpenRouter's OpenAI-compatible endpoint with
//! `google/gemini-2.0-flash-001`. Any `edgequake-llm` provider can be used
//! instead via [`OcrConfigBuilder::provider_name`], and tests or callers with
//! custom middleware can supply their own [`OcrBackend`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod processor;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{LlmProviderBackend, OcrBackend, OcrResponse, OpenRouterBackend};
pub use config::{OcrConfig, OcrConfigBuilder, RasterFormat};
pub use convert::{inspect, ocr_pdf, ocr_pdf_sync, ocr_pdf_to_file, ocr_pdf_with_key};
pub use error::{PageError, PdfOcrError};
pub use output::{default_output_path, DocumentInfo, OcrDocument, PageResult};
pub use processor::PageProcessor;
pub use progress::{NoopProgressCallback, OcrProgressCallback, ProgressCallback};
