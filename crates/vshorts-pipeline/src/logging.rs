//! Structured run logging.
//!
//! Every log line emitted through [`RunLogger`] carries the run ID and the
//! operation so a single run can be followed in JSON logs.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Logger bound to one pipeline run and operation.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    operation: String,
}

impl RunLogger {
    /// Create a logger for a fresh run.
    pub fn new(operation: &str) -> Self {
        Self::from_string(&Uuid::new_v4().to_string(), operation)
    }

    /// Create a logger for an existing run ID.
    pub fn from_string(run_id: &str, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the run context, for instrumenting whole stages.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let logger = RunLogger::new("find_highlights");
        assert!(Uuid::parse_str(logger.run_id()).is_ok());
        assert_eq!(logger.operation(), "find_highlights");
    }

    #[test]
    fn test_from_string_keeps_run_id() {
        let logger = RunLogger::from_string("run-42", "scoring");
        assert_eq!(logger.run_id(), "run-42");
        assert_eq!(logger.operation(), "scoring");
    }

    #[test]
    fn test_logging_methods() {
        let logger = RunLogger::from_string("run-1", "test");
        logger.log_start("starting");
        logger.log_progress("halfway");
        logger.log_warning("careful");
        logger.log_error("broken");
        logger.log_completion("done");
        let _span = logger.create_span();
    }
}
