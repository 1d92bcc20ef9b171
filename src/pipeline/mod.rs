//! Pipeline stages for PDF OCR.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ request ──▶ backend
//! (path)    (pdfium)   (base64)   (chat body)  (VLM)
//! ```
//!
//! 1. [`input`]: check the path is a readable file with a `%PDF` header
//! 2. [`render`]: rasterise every page and stage it in a temp directory;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: load a staged page, PNG-encode and base64-wrap it
//! 4. [`request`]: the fixed two-message OCR request and its wire body
//!
//! The network call itself lives behind [`crate::backend::OcrBackend`].

pub mod encode;
pub mod input;
pub mod render;
pub mod request;
