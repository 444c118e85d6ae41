/// Remote text-understanding service client.
///
/// The delegated interpreter only needs "prompt in, text out"; `LlmProvider`
/// is that seam. `AnthropicProvider` speaks the Messages API.
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub mod policy;

pub use policy::{CallPolicy, RetryConfig};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed reply: {0}")]
    MalformedReply(String),

    #[error("empty reply")]
    EmptyReply,

    #[error("no credential configured")]
    NotConfigured,
}

impl LlmError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(_) | LlmError::Timeout(_) => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            LlmError::MalformedReply(_) | LlmError::EmptyReply | LlmError::NotConfigured => false,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Transport(_) => "transport",
            LlmError::Status { .. } => "status",
            LlmError::Timeout(_) => "timeout",
            LlmError::MalformedReply(_) => "malformed",
            LlmError::EmptyReply => "empty",
            LlmError::NotConfigured => "not_configured",
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the prompt
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;

    /// Provider name
    fn name(&self) -> &str;

    fn model(&self) -> &str;
}

// ============================================
// Anthropic Claude Provider
// ============================================

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let client = HttpClient::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedReply(e.to_string()))?;

        let text: String = result
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(LlmError::EmptyReply);
        }

        debug!(model = %self.model, reply_len = text.len(), "anthropic completion received");
        Ok(text)
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_is_not_configured() {
        assert!(matches!(
            AnthropicProvider::new("  ", "m", "http://localhost"),
            Err(LlmError::NotConfigured)
        ));
    }

    #[test]
    fn retryable_classification() {
        assert!(LlmError::Timeout(Duration::from_millis(5)).is_retryable());
        assert!(LlmError::Transport("reset".into()).is_retryable());
        assert!(LlmError::Status {
            status: 529,
            body: String::new()
        }
        .is_retryable());
        assert!(LlmError::Status {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(!LlmError::Status {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!LlmError::MalformedReply("x".into()).is_retryable());
    }
}
