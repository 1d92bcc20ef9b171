//! `edgequake-llm` provider backend.
//!
//! Lets a run use any vision provider `edgequake-llm` knows about instead of
//! the OpenRouter endpoint. The same two messages are sent; the image travels
//! as an attachment on the user message.

use super::{OcrBackend, OcrResponse};
use crate::error::{PageError, PdfOcrError};
use crate::pipeline::request::OcrRequest;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Wraps an `edgequake-llm` provider.
pub struct LlmProviderBackend {
    name: String,
    provider: Arc<dyn LLMProvider>,
}

impl LlmProviderBackend {
    /// Wrap an already-configured provider.
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    /// Create a provider by name (e.g. "openai", "anthropic", "ollama").
    ///
    /// The provider reads its own credential variable (`OPENAI_API_KEY`, …).
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, PdfOcrError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            PdfOcrError::BackendNotConfigured {
                backend: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider_name, provider))
    }
}

#[async_trait]
impl OcrBackend for LlmProviderBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &OcrRequest) -> Result<OcrResponse, PageError> {
        let image = ImageData::new(request.image.data.clone(), request.image.mime_type)
            .with_detail("high");
        let messages = vec![
            ChatMessage::system(request.system_prompt),
            ChatMessage::user_with_images(request.user_prompt, vec![image]),
        ];
        let options = build_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| PageError::Request {
                page: request.page,
                detail: format!("{}: {}", self.name, e),
            })?;

        debug!(
            "Page {}: {} input tokens, {} output tokens",
            request.page, response.prompt_tokens, response.completion_tokens
        );

        let raw = format!("{:?}", response);
        Ok(OcrResponse {
            text: response.content,
            raw,
        })
    }
}

/// Generation parameters carried over from the request.
fn build_options(request: &OcrRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OcrConfig;
    use crate::pipeline::encode::EncodedImage;

    #[test]
    fn build_options_defaults() {
        let image = EncodedImage {
            mime_type: "image/png",
            data: String::new(),
        };
        let req = OcrRequest::new(1, image, &OcrConfig::default());
        let opts = build_options(&req);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }
}
