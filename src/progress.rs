//! Progress-callback trait for per-page OCR events.
//!
//! Inject an [`Arc<dyn OcrProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to receive events
//! as the processor works through the document. The CLI renders them as an
//! `indicatif` progress bar; library users can forward them anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdf_ocr::{OcrConfig, OcrProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter(AtomicUsize);
//!
//! impl OcrProgressCallback for FailureCounter {
//!     fn on_page_error(&self, page: usize, _total: usize, error: &str) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page} needs manual review: {error}");
//!     }
//! }
//!
//! let config = OcrConfig::builder()
//!     .progress_callback(Arc::new(FailureCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the processor as it handles each page.
///
/// All methods have default no-op implementations. With
/// `concurrency > 1`, page events may arrive from several tasks at once, so
/// implementations must synchronise shared state.
pub trait OcrProgressCallback: Send + Sync {
    /// Called once, after rasterisation, before the first OCR request.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the OCR request for a page is sent.
    fn on_page_start(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called when a page's text came back, with the text as recorded.
    fn on_page_complete(&self, page: usize, total_pages: usize, text: &str) {
        let _ = (page, total_pages, text);
    }

    /// Called when a page's OCR call failed. The run continues.
    fn on_page_error(&self, page: usize, total_pages: usize, error: &str) {
        let _ = (page, total_pages, error);
    }

    /// Called once after every page has been attempted.
    fn on_run_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl OcrProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn OcrProgressCallback>;
