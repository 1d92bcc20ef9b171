//! OpenAI-compatible chat-completions client (OpenRouter by default).

use super::{OcrBackend, OcrResponse};
use crate::error::{PageError, PdfOcrError};
use crate::pipeline::request::OcrRequest;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Longest service error body kept in a [`PageError::Service`].
const MAX_ERROR_BODY_CHARS: usize = 2000;

/// Talks to `POST {base_url}/chat/completions` with a bearer key.
///
/// The key is passed in by the caller and held only by this value.
pub struct OpenRouterBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenRouterBackend {
    /// Create a client for `base_url` (e.g. `https://openrouter.ai/api/v1`).
    ///
    /// # Errors
    /// [`PdfOcrError::MissingApiKey`] for an empty or blank key.
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, PdfOcrError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PdfOcrError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("pdf-ocr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PdfOcrError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for OpenRouterBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterBackend")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl OcrBackend for OpenRouterBackend {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &OcrRequest) -> Result<OcrResponse, PageError> {
        let page = request.page;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request.to_chat_body())
            .send()
            .await
            .map_err(|e| PageError::Request {
                page,
                detail: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PageError::Request {
            page,
            detail: format!("reading response body: {e}"),
        })?;
        debug!("Page {}: HTTP {} ({} bytes)", page, status, body.len());

        if !status.is_success() {
            return Err(PageError::Service {
                page,
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let text = extract_message_content(&body)
            .map_err(|detail| PageError::MalformedResponse { page, detail })?;

        Ok(OcrResponse { text, raw: body })
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body.
///
/// Content given as an array of parts is joined from its `text` parts. An
/// `error` object in a 2xx body (some gateways do this) is reported as
/// malformed. Empty content is valid: a blank page has no text.
pub fn extract_message_content(body: &str) -> Result<String, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("response is not JSON: {e}"))?;

    if let Some(err) = value.get("error") {
        return Err(format!("service reported an error: {err}"));
    }

    let content = value
        .pointer("/choices/0/message/content")
        .ok_or_else(|| "missing choices[0].message.content".to_string())?;

    match content {
        Value::String(s) => Ok(s.clone()),
        Value::Array(parts) => Ok(parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect()),
        Value::Null => Err("choices[0].message.content is null".to_string()),
        other => Err(format!("unexpected content type: {other}")),
    }
}
