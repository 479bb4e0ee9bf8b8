/// LLM Client: the single point of entry for all chat-completion calls.
///
/// No other module talks to the OpenAI API directly; everything goes through
/// `CompletionService`, which `OpenAiClient` implements for production.
///
/// Model: gpt-5.2 (hardcoded, not configurable)
///
/// Calls are never retried. A failed call fails the whole generation request.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

#[cfg(test)]
pub mod fake;

/// The model used for all completion calls.
pub const MODEL: &str = "gpt-5.2";
/// Matches the OpenAI SDK default read timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned no choices")]
    NoChoices,

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One completion call: a role framing, an instruction, and an output cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_output_tokens: u32,
}

/// Anything that can turn a `CompletionRequest` into text.
///
/// Carried in `AppState` as `Arc<dyn CompletionService>`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns the trimmed text of the first completion choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (Chat Completions API)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Trimmed text of the first choice.
    pub fn first_text(&self) -> Result<&str, LlmError> {
        let choice = self.choices.first().ok_or(LlmError::NoChoices)?;
        choice
            .message
            .content
            .as_deref()
            .map(str::trim)
            .ok_or(LlmError::EmptyContent)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

fn build_request_body<'a>(request: &'a CompletionRequest) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model: MODEL,
        messages: [
            ChatMessage {
                role: "system",
                content: &request.system,
            },
            ChatMessage {
                role: "user",
                content: &request.prompt,
            },
        ],
        max_completion_tokens: request.max_output_tokens,
    }
}

fn parse_error_body(body: String) -> String {
    serde_json::from_str::<OpenAiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

// ────────────────────────────────────────────────────────────────────────────
// Production client
// ────────────────────────────────────────────────────────────────────────────

/// Chat Completions client. Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            endpoint: completions_endpoint(base_url),
        })
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = build_request_body(request);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: parse_error_body(body),
            });
        }

        let raw = response.text().await?;
        let completion: ChatCompletionResponse = serde_json::from_str(&raw)?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        completion.first_text().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CompletionRequest {
        CompletionRequest {
            system: "You are an expert technical resume writer.".into(),
            prompt: "Create a resume".into(),
            max_output_tokens: 900,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let request = sample_request();
        let value = serde_json::to_value(build_request_body(&request)).unwrap();

        assert_eq!(value["model"], MODEL);
        assert_eq!(value["max_completion_tokens"], 900);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(
            value["messages"][0]["content"],
            "You are an expert technical resume writer."
        );
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "Create a resume");
    }

    #[test]
    fn test_first_text_is_trimmed() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"\n  # Jane Doe\n\n"}},
                     {"message":{"role":"assistant","content":"second"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.first_text().unwrap(), "# Jane Doe");
    }

    #[test]
    fn test_no_choices_is_an_error() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(response.first_text(), Err(LlmError::NoChoices)));
    }

    #[test]
    fn test_null_content_is_an_error() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(response.first_text(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_malformed_response_fails_to_parse() {
        let result: Result<ChatCompletionResponse, _> = serde_json::from_str(r#"{"id":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_body_message_is_extracted() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(parse_error_body(body.to_string()), "Incorrect API key provided");
        assert_eq!(parse_error_body("gateway timeout".to_string()), "gateway timeout");
    }

    #[test]
    fn test_completions_endpoint_strips_trailing_slash() {
        assert_eq!(
            completions_endpoint("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }
}
