//! Pipeline error types.

use thiserror::Error;
use vshorts_models::TimestampError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Signal extraction failed at {time:.1}s: {message}")]
    ExtractionFailure { time: f64, message: String },

    #[error("Scoring failed: {0}")]
    ScoringFailure(String),

    #[error("Scorer request budget of {limit} calls exhausted")]
    BudgetExhausted { limit: u64 },

    #[error("No highlights found")]
    NoHighlightsFound,

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media error: {0}")]
    Media(#[from] vshorts_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn extraction_failure(time: f64, message: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            time,
            message: message.into(),
        }
    }

    pub fn invalid_bounds(msg: impl Into<String>) -> Self {
        Self::InvalidBounds(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Oracle failure while scoring the window at `time`.
    pub fn oracle_failure(tier: &str, time: f64, error: &vshorts_ai::AiError) -> Self {
        Self::ScoringFailure(format!("{} score at {:.1}s: {}", tier, time, error))
    }
}

impl From<TimestampError> for PipelineError {
    fn from(e: TimestampError) -> Self {
        Self::InvalidBounds(e.to_string())
    }
}
