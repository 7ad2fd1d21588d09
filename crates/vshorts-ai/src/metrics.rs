//! Oracle request metrics.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const ORACLE_REQUESTS_TOTAL: &str = "vshorts_oracle_requests_total";
    pub const ORACLE_FAILURES_TOTAL: &str = "vshorts_oracle_failures_total";
    pub const ORACLE_TOKENS_TOTAL: &str = "vshorts_oracle_tokens_total";
    pub const ORACLE_COST_USD: &str = "vshorts_oracle_cost_usd";
    pub const ORACLE_LATENCY_SECONDS: &str = "vshorts_oracle_latency_seconds";
}

/// Record a completed oracle request.
pub fn record_request(model: &str, input_tokens: u64, output_tokens: u64, cost: f64, latency_secs: f64) {
    let model_label = [("model", model.to_string())];
    counter!(names::ORACLE_REQUESTS_TOTAL, &model_label).increment(1);
    histogram!(names::ORACLE_COST_USD, &model_label).record(cost);
    histogram!(names::ORACLE_LATENCY_SECONDS, &model_label).record(latency_secs);

    let input = [("model", model.to_string()), ("direction", "input".to_string())];
    counter!(names::ORACLE_TOKENS_TOTAL, &input).increment(input_tokens);
    let output = [("model", model.to_string()), ("direction", "output".to_string())];
    counter!(names::ORACLE_TOKENS_TOTAL, &output).increment(output_tokens);
}

/// Record a request that failed after retries.
pub fn record_failure(model: &str) {
    let labels = [("model", model.to_string())];
    counter!(names::ORACLE_FAILURES_TOTAL, &labels).increment(1);
}
