//! Oracle client configuration.

use std::time::Duration;

use crate::error::{AiError, AiResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat API configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Bearer token for the chat API
    pub api_key: String,
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Model used for the cheap pre-score
    pub pre_score_model: String,
    /// Model used for the detailed score and view estimates
    pub detailed_model: String,
    /// Model used for the detailed score when a still frame is attached
    pub vision_model: String,
    pub pre_score_max_tokens: u32,
    pub detailed_max_tokens: u32,
    pub estimate_max_tokens: u32,
    /// Requests per minute across all models
    pub requests_per_minute: u32,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Retries after the first attempt for retryable failures
    pub max_retries: u32,
}

impl AiConfig {
    /// Defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            pre_score_model: "gpt-3.5-turbo".to_string(),
            detailed_model: "gpt-4".to_string(),
            vision_model: "gpt-4o".to_string(),
            pre_score_max_tokens: 50,
            detailed_max_tokens: 150,
            estimate_max_tokens: 500,
            requests_per_minute: 60,
            request_timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create config from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; everything else falls back to defaults.
    pub fn from_env() -> AiResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::config("OPENAI_API_KEY not set"))?;

        let defaults = Self::new(api_key);

        Ok(Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url.clone()),
            pre_score_model: std::env::var("VSHORTS_PRE_SCORE_MODEL")
                .unwrap_or(defaults.pre_score_model.clone()),
            detailed_model: std::env::var("VSHORTS_DETAILED_MODEL")
                .unwrap_or(defaults.detailed_model.clone()),
            vision_model: std::env::var("VSHORTS_VISION_MODEL")
                .unwrap_or(defaults.vision_model.clone()),
            requests_per_minute: std::env::var("VSHORTS_REQUESTS_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|rpm| *rpm > 0)
                .unwrap_or(defaults.requests_per_minute),
            request_timeout: Duration::from_secs(
                std::env::var("VSHORTS_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("VSHORTS_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            ..defaults
        })
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AiConfig::new("sk-test");
        assert_eq!(config.pre_score_model, "gpt-3.5-turbo");
        assert_eq!(config.detailed_model, "gpt-4");
        assert_eq!(config.pre_score_max_tokens, 50);
        assert_eq!(config.detailed_max_tokens, 150);
    }

    #[test]
    fn test_chat_completions_url_strips_trailing_slash() {
        let config = AiConfig::new("sk-test").with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
