//! Prometheus metrics for pipeline runs.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // Screening
    pub const WINDOWS_SCREENED_TOTAL: &str = "vshorts_windows_screened_total";

    // Scoring
    pub const SCORER_CALLS_TOTAL: &str = "vshorts_scorer_calls_total";
    pub const SEGMENTS_TOTAL: &str = "vshorts_segments_total";

    // Merging and selection
    pub const CANDIDATES_DISCARDED_TOTAL: &str = "vshorts_candidates_discarded_total";
    pub const HIGHLIGHTS_SELECTED_TOTAL: &str = "vshorts_highlights_selected_total";

    // Output
    pub const SHORTS_CUT_TOTAL: &str = "vshorts_shorts_cut_total";
    pub const FALLBACK_RUNS_TOTAL: &str = "vshorts_fallback_runs_total";

    pub const STAGE_DURATION_SECONDS: &str = "vshorts_stage_duration_seconds";
}

/// Record screened windows. `outcome` is one of retained, rejected, failed, capped.
pub fn record_windows(outcome: &str, count: usize) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::WINDOWS_SCREENED_TOTAL, &labels).increment(count as u64);
}

/// Record an oracle call issued for scoring (`tier` is pre or detailed).
pub fn record_scorer_call(tier: &str) {
    let labels = [("tier", tier.to_string())];
    counter!(names::SCORER_CALLS_TOTAL, &labels).increment(1);
}

/// Record how forwarded windows ended (scored, gated, failed, budget).
pub fn record_segments(outcome: &str, count: usize) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SEGMENTS_TOTAL, &labels).increment(count as u64);
}

pub fn record_candidate_discarded(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::CANDIDATES_DISCARDED_TOTAL, &labels).increment(1);
}

pub fn record_highlights_selected(count: usize) {
    counter!(names::HIGHLIGHTS_SELECTED_TOTAL).increment(count as u64);
}

pub fn record_short_cut(success: bool) {
    let labels = [("status", if success { "success" } else { "failure" }.to_string())];
    counter!(names::SHORTS_CUT_TOTAL, &labels).increment(1);
}

pub fn record_fallback() {
    counter!(names::FALLBACK_RUNS_TOTAL).increment(1);
}

/// Record wall-clock time spent in one pipeline stage.
pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batched_counts_are_added_once() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_windows("capped", 3);
            record_windows("retained", 1);
            record_segments("budget", 4);
        });

        let rendered = handle.render();
        assert!(rendered.contains("vshorts_windows_screened_total{outcome=\"capped\"} 3"));
        assert!(rendered.contains("vshorts_windows_screened_total{outcome=\"retained\"} 1"));
        assert!(rendered.contains("vshorts_segments_total{outcome=\"budget\"} 4"));
    }
}
