//! OCR backends: who actually reads the page image.
//!
//! The processor only sees [`OcrBackend`]. Two implementations ship:
//!
//! * [`OpenRouterBackend`]: the default. Speaks the OpenAI-compatible
//!   chat-completions protocol over `reqwest` and keeps the response body
//!   verbatim for audit.
//! * [`LlmProviderBackend`]: any `edgequake-llm` provider (OpenAI,
//!   Anthropic, Gemini, Ollama …), selected by name.
//!
//! Tests plug in their own implementations through
//! [`crate::config::OcrConfigBuilder::backend`].

mod llm;
mod openrouter;

pub use llm::LlmProviderBackend;
pub use openrouter::{extract_message_content, OpenRouterBackend};

use crate::config::OcrConfig;
use crate::error::{PageError, PdfOcrError};
use crate::pipeline::request::OcrRequest;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A successful OCR call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrResponse {
    /// The model's text, untouched.
    pub text: String,
    /// The full service response as received.
    pub raw: String,
}

/// A remote (or fake) service that turns one page request into text.
///
/// Implementations report failures as [`PageError`] and must not panic; the
/// processor turns an `Err` into a failure-marked page and moves on.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Run one OCR request.
    async fn complete(&self, request: &OcrRequest) -> Result<OcrResponse, PageError>;
}

/// Pick the backend for a run, from most-specific to least-specific:
///
/// 1. a pre-built backend on the config,
/// 2. a named `edgequake-llm` provider (reads its own key variable),
/// 3. the OpenRouter endpoint with the explicit `api_key`.
///
/// # Errors
/// [`PdfOcrError::MissingApiKey`] when case 3 applies and no non-empty key
/// was given; [`PdfOcrError::BackendNotConfigured`] when a named provider
/// cannot be created.
pub fn resolve_backend(
    config: &OcrConfig,
    api_key: Option<&str>,
) -> Result<Arc<dyn OcrBackend>, PdfOcrError> {
    if let Some(ref backend) = config.backend {
        debug!("Using pre-built backend '{}'", backend.name());
        return Ok(Arc::clone(backend));
    }

    if let Some(ref name) = config.provider_name {
        debug!("Using edgequake-llm provider '{}' / {}", name, config.model);
        return Ok(Arc::new(LlmProviderBackend::from_name(name, &config.model)?));
    }

    let key = api_key.ok_or(PdfOcrError::MissingApiKey)?;
    Ok(Arc::new(OpenRouterBackend::new(key, &config.base_url)?))
}
