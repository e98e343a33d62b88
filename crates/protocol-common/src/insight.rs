//! HTTP client for the external insight generator.
//!
//! The insight service is an OpenAI-compatible chat-completions endpoint that
//! turns a structured comparison summary into natural-language
//! recommendations. The engine treats it as strictly optional: every request
//! is a single attempt under a bounded timeout, and any failure degrades to
//! the deterministic fallback. Retries, if wanted, belong to the caller.
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Debug)]
pub struct InsightClientConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_error_body_bytes: usize,
}

impl InsightClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` when `INSIGHT_BASE_URL` is unset: the collaborator is
    /// unconfigured and callers fall back without ever constructing a client.
    ///
    /// Optional:
    /// - `INSIGHT_MODEL` (default "gpt-4o-mini")
    /// - `INSIGHT_TIMEOUT_SECS` (default 20)
    /// - `INSIGHT_MAX_ERROR_BODY_BYTES` (default 8 KiB)
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("INSIGHT_BASE_URL").ok()?;

        let model = std::env::var("INSIGHT_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let timeout = std::env::var("INSIGHT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(20));

        let max_error_body_bytes = std::env::var("INSIGHT_MAX_ERROR_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(8 * 1024);

        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
            max_error_body_bytes,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("completion response contained no choices")]
    EmptyCompletion,
}

#[derive(Clone)]
pub struct InsightClient {
    config: InsightClientConfig,
    http: reqwest::Client,
}

impl InsightClient {
    pub fn new(config: InsightClientConfig) -> Result<Self, InsightError> {
        let http = reqwest::Client::builder()
            .user_agent("protocol-engine/insight")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &InsightClientConfig {
        &self.config
    }

    /// Send one chat completion and return the assistant message content.
    ///
    /// Single attempt, bounded by the configured timeout. The structural
    /// comparison this augments is already complete by the time this runs,
    /// so no failure here is worth waiting on.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, InsightError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: Some(0.7),
            max_tokens: Some(2000),
        };

        let resp = self
            .http
            .post(&url)
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await?;

        let parsed: ChatCompletionResponse =
            Self::parse_json_response(resp, self.config.max_error_body_bytes).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(InsightError::EmptyCompletion)
    }

    async fn parse_json_response<T: for<'de> Deserialize<'de>>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, InsightError> {
        if resp.status().is_success() {
            let json = resp.json::<T>().await?;
            return Ok(json);
        }
        Err(Self::to_upstream_error(resp, max_error_body_bytes).await)
    }

    async fn to_upstream_error(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> InsightError {
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        if let Ok(parsed) = serde_json::from_str::<UpstreamErrorEnvelope>(&body) {
            let message = parsed
                .error
                .message
                .unwrap_or_else(|| "unknown upstream error".to_string());
            return InsightError::Upstream { status, message };
        }
        InsightError::UpstreamBody { status, body }
    }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorEnvelope {
    error: UpstreamErrorObject,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorObject {
    message: Option<String>,
    #[allow(dead_code)]
    r#type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_absent_without_base_url() {
        std::env::remove_var("INSIGHT_BASE_URL");
        assert!(InsightClientConfig::from_env().is_none());
    }

    #[test]
    fn test_request_serialization_omits_unset_options() {
        let req = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![],
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("hello")
        );
    }
}
