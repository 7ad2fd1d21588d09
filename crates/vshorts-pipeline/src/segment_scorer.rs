//! Two-tier semantic scoring of screened windows.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use vshorts_ai::{ScoringContext, SemanticScorer};
use vshorts_models::{sort_by_time, SegmentRecord};

use crate::config::ScoringConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;
use crate::screener::{release_windows, ScreenedWindow};

/// Scores windows with a cheap gate in front of the expensive oracle tier.
pub struct SegmentScorer {
    scorer: Arc<dyn SemanticScorer>,
    config: ScoringConfig,
    calls: AtomicU64,
}

impl SegmentScorer {
    pub fn new(scorer: Arc<dyn SemanticScorer>, config: ScoringConfig) -> Self {
        Self {
            scorer,
            config,
            calls: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Oracle calls issued so far.
    pub fn calls_made(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Take one call from the budget, or fail once it is spent.
    fn reserve_call(&self, tier: &str) -> PipelineResult<()> {
        let limit = self.config.max_scorer_calls;
        self.calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |made| match limit {
                Some(limit) if made >= limit => None,
                _ => Some(made + 1),
            })
            .map_err(|_| PipelineError::BudgetExhausted {
                limit: limit.unwrap_or_default(),
            })?;
        metrics::record_scorer_call(tier);
        Ok(())
    }

    /// Score one window.
    ///
    /// `Ok(None)` means the pre-score stayed below the gate and the detailed
    /// tier was never asked.
    pub async fn score(&self, window: &ScreenedWindow) -> PipelineResult<Option<SegmentRecord>> {
        let mode = self.config.mode;
        let mut ctx = ScoringContext::new(window.time, window.signals.clone());

        let pre_score = if mode.uses_pre_score() {
            self.reserve_call("pre")?;
            let pre = self
                .scorer
                .pre_score(&ctx)
                .await
                .map_err(|e| PipelineError::oracle_failure("pre", window.time, &e))?;
            let value = pre.score.get();
            if pre.score.is_defaulted() {
                debug!(time = window.time, reply = %pre.reply, "Pre-score defaulted");
            }
            if value < self.config.pre_score_gate {
                debug!(
                    time = window.time,
                    pre_score = value,
                    gate = self.config.pre_score_gate,
                    "Window gated by pre-score"
                );
                metrics::record_segments("gated", 1);
                return Ok(None);
            }
            ctx = ctx.with_pre_score(value);
            Some(value)
        } else {
            None
        };

        ctx = ctx.with_frame(window.frame().map(Path::to_path_buf));

        self.reserve_call("detailed")?;
        let detailed = self
            .scorer
            .detailed_score(&ctx)
            .await
            .map_err(|e| PipelineError::oracle_failure("detailed", window.time, &e))?;
        if detailed.emotional.is_defaulted() || detailed.viral.is_defaulted() {
            debug!(time = window.time, "Detailed score fell back to defaults");
        }

        let record = SegmentRecord::new(
            window.time,
            &window.signals,
            detailed.emotional.get(),
            detailed.viral.get(),
            pre_score,
            detailed.title.into_value(),
            detailed.description,
            mode,
        );

        debug!(
            time = record.time,
            composite = record.composite_score,
            title = %record.title,
            "Window scored"
        );
        Ok(Some(record))
    }

    /// Score windows in the order given and return records sorted by time.
    ///
    /// Every window's artifacts are deleted once it has been handled. A
    /// failing window is skipped; an exhausted budget ends the batch.
    pub async fn score_all(&self, windows: Vec<ScreenedWindow>) -> Vec<SegmentRecord> {
        let total = windows.len();
        let mut records = Vec::with_capacity(total);
        let mut pending = windows.into_iter();

        while let Some(window) = pending.next() {
            let result = self.score(&window).await;
            window.release().await;

            match result {
                Ok(Some(record)) => {
                    metrics::record_segments("scored", 1);
                    records.push(record);
                }
                Ok(None) => {}
                Err(PipelineError::BudgetExhausted { limit }) => {
                    let rest: Vec<ScreenedWindow> = pending.by_ref().collect();
                    warn!(
                        limit,
                        skipped = rest.len() + 1,
                        "Scorer budget exhausted, skipping remaining windows"
                    );
                    metrics::record_segments("budget", rest.len() + 1);
                    release_windows(&rest).await;
                    break;
                }
                Err(e) => {
                    warn!(time = window.time, error = %e, "Scoring failed, skipping window");
                    metrics::record_segments("failed", 1);
                }
            }
        }

        sort_by_time(&mut records);
        info!(
            windows = total,
            records = records.len(),
            calls = self.calls_made(),
            "Scoring finished"
        );
        records
    }
}
