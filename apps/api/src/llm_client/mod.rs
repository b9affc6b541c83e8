/// Generation client — the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the generation API directly.
/// All model interactions MUST go through this module.
///
/// The backend speaks one of two wire styles (chat messages vs. plain
/// completion). The style is fixed once at construction via [`ClientStyle`] —
/// never probed per call.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const CHAT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const COMPLETION_API_URL: &str = "https://api.anthropic.com/v1/complete";
const API_VERSION: &str = "2023-06-01";
/// The model used for all generation calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("generation backend returned empty content")]
    EmptyContent,
}

/// Wire style of the generation backend, selected once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStyle {
    /// Structured messages endpoint (system + user turns).
    Chat,
    /// Legacy single-prompt completion endpoint.
    Completion,
}

/// Free-text generation collaborator contract: prompt in, completion out.
/// No structural guarantee on the output shape — callers own parsing.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ChatResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens_to_sample: u32,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<&'a str>>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    completion: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The single generation client used by every capability in the service.
/// Wraps the backend API with retry logic (exponential backoff on 429/5xx).
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    api_key: String,
    style: ClientStyle,
}

impl GenerationClient {
    pub fn new(api_key: String, style: ClientStyle) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            style,
        }
    }

    pub fn style(&self) -> ClientStyle {
        self.style
    }

    /// Makes a generation call, returning the completion text.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    async fn call(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "generation call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let request = match self.style {
                ClientStyle::Chat => self
                    .client
                    .post(CHAT_API_URL)
                    .json(&ChatRequest {
                        model: MODEL,
                        max_tokens: MAX_TOKENS,
                        system,
                        messages: vec![ChatMessage {
                            role: "user",
                            content: prompt,
                        }],
                    })
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", API_VERSION)
                    .header("content-type", "application/json"),
                ClientStyle::Completion => self
                    .client
                    .post(COMPLETION_API_URL)
                    .json(&CompletionRequest {
                        model: MODEL,
                        max_tokens_to_sample: MAX_TOKENS,
                        prompt: format!("{system}\n\nHuman: {prompt}\n\nAssistant:"),
                        stop_sequences: Some(vec!["\n\nHuman:"]),
                    })
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", API_VERSION)
                    .header("content-type", "application/json"),
            };

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("generation API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Try to parse a structured error message
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let text = match self.style {
                ClientStyle::Chat => {
                    let chat: ChatResponse = response.json().await.map_err(LlmError::Http)?;
                    debug!(
                        "generation call succeeded: input_tokens={}, output_tokens={}",
                        chat.usage.input_tokens, chat.usage.output_tokens
                    );
                    chat.text().map(str::to_string)
                }
                ClientStyle::Completion => {
                    let completion: CompletionResponse =
                        response.json().await.map_err(LlmError::Http)?;
                    Some(completion.completion)
                }
            };

            let text = text.ok_or(LlmError::EmptyContent)?;
            if text.trim().is_empty() {
                return Err(LlmError::EmptyContent);
            }
            return Ok(text.trim().to_string());
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl Generate for GenerationClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.call(prompt, system).await
    }
}
