//! OpenAI-compatible chat-completions client.
//!
//! Every request waits on a per-minute rate limiter, is retried with
//! exponential backoff on 429/5xx and transport errors, and is metered by
//! the shared [`UsageTracker`].

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::error::{AiError, AiResult};
use crate::metrics;
use crate::retry::{retry_async, RetryConfig};
use crate::usage::{RequestUsage, UsageTracker};

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message with an attached image (data URL or http URL).
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Reply text plus what it cost.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: RequestUsage,
}

/// Rate-limited, retrying chat client.
pub struct ChatClient {
    http: Client,
    config: AiConfig,
    limiter: DefaultDirectRateLimiter,
    retry: RetryConfig,
    usage: Arc<UsageTracker>,
}

impl ChatClient {
    pub fn new(config: AiConfig) -> AiResult<Self> {
        Self::with_usage(config, Arc::new(UsageTracker::new()))
    }

    /// Create a client that meters into an existing tracker.
    pub fn with_usage(config: AiConfig, usage: Arc<UsageTracker>) -> AiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AiError::config("API key is empty"));
        }

        let http = Client::builder().timeout(config.request_timeout).build()?;

        let rpm = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_minute(rpm));

        let retry = RetryConfig::new("chat completion").with_max_retries(config.max_retries);

        Ok(Self {
            http,
            config,
            limiter,
            retry,
            usage,
        })
    }

    /// Override the backoff schedule.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Send one chat completion and return the first choice's text.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> AiResult<Completion> {
        let request = ChatRequest {
            model,
            messages,
            max_tokens,
        };
        let request = &request;
        let started = Instant::now();

        let result = retry_async(&self.retry, AiError::is_retryable, || async move {
            self.limiter.until_ready().await;
            self.send(request).await
        })
        .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(model, error = %e, "Chat completion failed");
                metrics::record_failure(model);
                return Err(e);
            }
        };

        let (input_tokens, output_tokens) = response
            .usage
            .as_ref()
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));
        let usage = self.usage.record(model, input_tokens, output_tokens);
        metrics::record_request(
            model,
            input_tokens,
            output_tokens,
            usage.cost,
            started.elapsed().as_secs_f64(),
        );

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(AiError::EmptyResponse)?;

        debug!(model, reply_len = text.len(), "Chat completion received");
        Ok(Completion { text, usage })
    }

    async fn send(&self, request: &ChatRequest<'_>) -> AiResult<ChatResponse> {
        let response = self
            .http
            .post(self.config.chat_completions_url())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| AiError::invalid_response(e.to_string()))
    }
}
