//! Fixed instruction prompts for page transcription.
//!
//! The wording is part of the OCR contract: every page is sent with the same
//! two messages so that results are comparable across pages and runs. Tests
//! import these constants directly to pin the request shape.

/// System-level instruction establishing verbatim, layout-preserving
/// transcription.
pub const SYSTEM_PROMPT: &str = "You are a professional OCR engine. Extract all visible text \
exactly as it appears. Preserve line breaks, spacing, special characters and formatting. \
Do not interpret or correct the text.";

/// User-level instruction sent alongside the page image.
pub const USER_PROMPT: &str = "Extract text verbatim from this image maintaining original \
layout including columns, tables, and mathematical notations.";
