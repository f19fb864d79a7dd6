//! Anthropic Messages API client. The letter polisher is its only caller.
//!
//! Retries share `RetryPolicy` with the page fetcher: 429, 5xx (including
//! 529 overload), timeouts and dropped connections are retried, anything else
//! is returned at once.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::retry::{FailureKind, RetryPolicy, Retryable};

pub mod prompts;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
/// Pinned so polished letters do not drift between deployments.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 2048;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_RETRY: RetryPolicy = RetryPolicy {
    max_retries: 2,
    base_backoff: Duration::from_secs(1),
};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("LLM answer contained no text")]
    EmptyContent,
}

impl Retryable for LlmError {
    fn kind(&self) -> FailureKind {
        match self {
            LlmError::Http(e) if e.is_timeout() || e.is_connect() => FailureKind::Transient,
            LlmError::Api { status, .. } if *status == 429 || *status >= 500 => {
                FailureKind::Transient
            }
            _ => FailureKind::Permanent,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'static str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserTurn<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<Block>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl MessagesResponse {
    fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.as_deref())
    }
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    endpoint: String,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Self::with_endpoint(api_key, MESSAGES_URL.to_string(), DEFAULT_RETRY)
    }

    fn with_endpoint(
        api_key: String,
        endpoint: String,
        retry: RetryPolicy,
    ) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key,
            endpoint,
            retry,
        })
    }

    /// One system + user exchange. Returns the answer text, code fences removed.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: [UserTurn {
                role: "user",
                content: prompt,
            }],
        };

        let client = self;
        let body = &request;
        let response = self
            .retry
            .run("LLM call", move || client.send(body))
            .await
            .map_err(|gave_up| gave_up.error)?;

        if let Some(usage) = &response.usage {
            debug!(
                "LLM call used {} input / {} output tokens",
                usage.input_tokens, usage.output_tokens
            );
        }

        let text = response.first_text().map(strip_code_fences).unwrap_or_default();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text.to_string())
    }

    /// A single attempt; non-success statuses become `LlmError::Api`.
    async fn send(&self, request: &MessagesRequest<'_>) -> Result<MessagesResponse, LlmError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&raw)
            .map(|envelope| envelope.error.message)
            .unwrap_or(raw);
        Err(LlmError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Strips ```text ... ``` or ``` ... ``` code fences from LLM output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line.
    let body = match stripped.split_once('\n') {
        Some((tag, body)) if !tag.trim().contains(' ') => body,
        _ => stripped,
    };
    body.trim_end()
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(body.trim())
}
