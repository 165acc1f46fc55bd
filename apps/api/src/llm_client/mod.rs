/// LLM Client: the single point of entry for all OpenAI calls in the story factory.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// Story and illustration code only see the `StoryModel` / `ImageModel` traits,
/// which this client implements.
///
/// Models are hardcoded. Do not make them configurable; every book must look alike.
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::illustration::ImageModel;
use crate::story::StoryModel;

/// The text model used to write stories.
pub const STORY_MODEL: &str = "gpt-4o";
/// The image model used for the cover and every illustration.
pub const IMAGE_MODEL: &str = "dall-e-3";
/// 4:3 landscape, the aspect the book layout is designed around.
pub const IMAGE_SIZE: &str = "1024x768";
const IMAGE_QUALITY: &str = "standard";
const STORY_TEMPERATURE: f32 = 0.7;
/// Whole-request HTTP deadline. Sits above the per-image deadline so that one
/// always fires first.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl LlmError {
    /// True when the call itself went through but the payload was unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            LlmError::Parse(_) | LlmError::EmptyContent | LlmError::Base64(_)
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single OpenAI client used by all services.
/// No retries: one failed call fails the request that issued it.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url,
        }
    }

    /// Calls chat completions in JSON-object mode and returns the raw message text.
    pub async fn chat_json(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: STORY_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: STORY_TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let chat: ChatResponse = serde_json::from_str(&response.text().await?)?;
        if let Some(usage) = &chat.usage {
            debug!(
                "Chat call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.text().map(str::to_owned).ok_or(LlmError::EmptyContent)
    }

    /// Generates one image and returns the base64-decoded image file bytes.
    pub async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, LlmError> {
        let request_body = ImageRequest {
            model: IMAGE_MODEL,
            prompt,
            size: IMAGE_SIZE,
            quality: IMAGE_QUALITY,
            n: 1,
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let images: ImageResponse = serde_json::from_str(&response.text().await?)?;
        let b64 = images
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or(LlmError::EmptyContent)?;

        let bytes = STANDARD.decode(b64.trim())?;
        debug!("Image call succeeded: {} bytes", bytes.len());
        Ok(bytes)
    }
}

/// Turns a non-2xx response into `LlmError::Api`, preferring OpenAI's own error message.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<OpenAiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[async_trait]
impl StoryModel for LlmClient {
    async fn write_story(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.chat_json(system, prompt).await
    }
}

#[async_trait]
impl ImageModel for LlmClient {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, LlmError> {
        self.generate_image(prompt).await
    }
}
