//! Semantic oracle for the highlight pipeline.
//!
//! Wraps an OpenAI-compatible chat-completions API behind the
//! [`SemanticScorer`] and [`PotentialEstimator`] traits, with rate limiting,
//! retries, lenient reply parsing and token/cost accounting.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod parse;
pub mod retry;
pub mod scorer;
pub mod usage;

pub use client::{ChatClient, ChatMessage, Completion};
pub use config::AiConfig;
pub use error::{AiError, AiResult};
pub use parse::{
    parse_detailed, parse_pre_score, parse_views, DetailedScore, PreScore, ViewEstimate,
    DEFAULT_SCORE, DEFAULT_TITLE, DEFAULT_VIEWS,
};
pub use retry::{retry_async, RetryConfig};
pub use scorer::{OpenAiScorer, PotentialEstimator, ScoringContext, SemanticScorer};
pub use usage::{request_cost, RequestUsage, UsageSummary, UsageTracker};
