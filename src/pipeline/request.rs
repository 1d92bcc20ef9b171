//! The page-scoped OCR request and its chat-completions wire form.
//!
//! ## Message layout
//!
//! 1. **System message**: the transcription policy ([`SYSTEM_PROMPT`])
//! 2. **User message**, two parts: the fixed instruction text
//!    ([`USER_PROMPT`]) followed by the page PNG as an inline `data:` URI

use crate::config::OcrConfig;
use crate::pipeline::encode::EncodedImage;
use crate::prompts::{SYSTEM_PROMPT, USER_PROMPT};
use serde::Serialize;

/// Everything needed to OCR one page. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrRequest {
    /// 1-indexed page this request is for (not sent on the wire).
    pub page: usize,
    pub model: String,
    pub system_prompt: &'static str,
    pub user_prompt: &'static str,
    pub image: EncodedImage,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl OcrRequest {
    /// Build the request for `page` using the fixed prompts and the
    /// generation parameters from `config`.
    pub fn new(page: usize, image: EncodedImage, config: &OcrConfig) -> Self {
        Self {
            page,
            model: config.model.clone(),
            system_prompt: SYSTEM_PROMPT,
            user_prompt: USER_PROMPT,
            image,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// The OpenAI-compatible `/chat/completions` body.
    pub fn to_chat_body(&self) -> ChatCompletionBody<'_> {
        ChatCompletionBody {
            model: &self.model,
            messages: vec![
                ChatMessage::System {
                    content: self.system_prompt,
                },
                ChatMessage::User {
                    content: vec![
                        ContentPart::Text {
                            text: self.user_prompt,
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: self.image.to_data_url(),
                            },
                        },
                    ],
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionBody<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: usize,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage<'a> {
    System { content: &'a str },
    User { content: Vec<ContentPart<'a>> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}
