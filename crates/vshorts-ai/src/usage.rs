//! Token and cost accounting for oracle calls.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Price of a model in USD per 1,000 tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Known model prices. Unknown models are metered at zero cost.
pub fn price_for(model: &str) -> Option<ModelPrice> {
    match model {
        "gpt-4" => Some(ModelPrice {
            input_per_1k: 0.03,
            output_per_1k: 0.06,
        }),
        "gpt-3.5-turbo" => Some(ModelPrice {
            input_per_1k: 0.001,
            output_per_1k: 0.002,
        }),
        _ => None,
    }
}

/// Cost in USD of one request.
pub fn request_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    price_for(model)
        .map(|p| {
            input_tokens as f64 / 1000.0 * p.input_per_1k
                + output_tokens as f64 / 1000.0 * p.output_per_1k
        })
        .unwrap_or(0.0)
}

/// Usage of a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestUsage {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

impl RequestUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Running totals for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// Thread-safe accumulator of request usage.
#[derive(Debug, Default)]
pub struct UsageTracker {
    totals: Mutex<UsageSummary>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one request to the totals and log its stats.
    pub fn record(&self, model: &str, input_tokens: u64, output_tokens: u64) -> RequestUsage {
        let usage = RequestUsage {
            model: model.to_string(),
            input_tokens,
            output_tokens,
            cost: request_cost(model, input_tokens, output_tokens),
        };

        let snapshot = {
            let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
            totals.requests += 1;
            totals.input_tokens += input_tokens;
            totals.output_tokens += output_tokens;
            totals.total_tokens += usage.total_tokens();
            totals.total_cost += usage.cost;
            totals.clone()
        };

        info!(
            model = %usage.model,
            tokens = usage.total_tokens(),
            input_tokens,
            output_tokens,
            cost = %format!("{:.4}", usage.cost),
            total_tokens = snapshot.total_tokens,
            total_cost = %format!("{:.4}", snapshot.total_cost),
            "Oracle request metered"
        );

        usage
    }

    pub fn summary(&self) -> UsageSummary {
        self.totals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
