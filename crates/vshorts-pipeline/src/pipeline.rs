//! End-to-end highlight pipeline: screen, score, merge, cut.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn, Instrument};
use vshorts_ai::{PotentialEstimator, SemanticScorer, UsageSummary, UsageTracker, ViewEstimate, DEFAULT_VIEWS};
use vshorts_media::{cut_clip, get_duration, SignalExtractor};
use vshorts_models::{validate_duration, validate_span, Highlight, ParsedField, ShortClip};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::fallback::uniform_slices;
use crate::logging::RunLogger;
use crate::merger::HighlightMerger;
use crate::metrics;
use crate::screener::Screener;
use crate::segment_scorer::SegmentScorer;
use crate::workspace::RunWorkspace;

/// View estimate for one cut short.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortEstimate {
    pub index: usize,
    pub estimate: ViewEstimate,
}

/// Everything a `generate_shorts` run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortsOutcome {
    pub run_id: String,
    pub source: PathBuf,
    pub duration: f64,
    /// Selected highlights, best first; empty when the fallback was used
    pub highlights: Vec<Highlight>,
    pub shorts: Vec<ShortClip>,
    pub used_fallback: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub estimates: Vec<ShortEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSummary>,
    pub generated_at: DateTime<Utc>,
}

impl ShortsOutcome {
    /// Write the outcome as pretty JSON.
    pub async fn write_json(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path.as_ref(), json).await?;
        Ok(())
    }
}

/// A span to cut, with the highlight metadata that goes with it.
struct CutRequest<'a> {
    start: f64,
    end: f64,
    highlight: Option<&'a Highlight>,
}

fn highlight_requests(highlights: &[Highlight]) -> Vec<CutRequest<'_>> {
    highlights
        .iter()
        .map(|h| CutRequest {
            start: h.start,
            end: h.end,
            highlight: Some(h),
        })
        .collect()
}

pub struct HighlightPipeline {
    config: PipelineConfig,
    screener: Screener,
    scorer: SegmentScorer,
    merger: HighlightMerger,
    estimator: Option<Arc<dyn PotentialEstimator>>,
    usage: Option<Arc<UsageTracker>>,
}

impl HighlightPipeline {
    pub fn new(
        config: PipelineConfig,
        extractor: Arc<dyn SignalExtractor>,
        scorer: Arc<dyn SemanticScorer>,
    ) -> Self {
        Self {
            screener: Screener::new(extractor, config.screening.clone()),
            scorer: SegmentScorer::new(scorer, config.scoring.clone()),
            merger: HighlightMerger::new(config.merge.clone()),
            config,
            estimator: None,
            usage: None,
        }
    }

    /// Estimate the reach of every short when `estimate_potential` is on.
    pub fn with_estimator(mut self, estimator: Arc<dyn PotentialEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Tracker whose summary is attached to the outcome.
    pub fn with_usage(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Oracle calls issued by this pipeline so far.
    pub fn scorer_calls(&self) -> u64 {
        self.scorer.calls_made()
    }

    /// Find the best highlights of `video`, best first.
    ///
    /// Fails with [`PipelineError::NoHighlightsFound`] when nothing qualifies.
    pub async fn find_highlights(&self, video: &Path, duration: f64) -> PipelineResult<Vec<Highlight>> {
        let logger = RunLogger::new("find_highlights");
        self.find_with_logger(video, duration, &logger).await
    }

    async fn find_with_logger(
        &self,
        video: &Path,
        duration: f64,
        logger: &RunLogger,
    ) -> PipelineResult<Vec<Highlight>> {
        let duration = validate_duration(duration)?;
        logger.log_start(&format!("{} ({:.1}s)", video.display(), duration));

        let workspace = RunWorkspace::create(logger.run_id(), self.config.work_dir.as_deref())?;
        let result = self
            .run_stages(video, duration, workspace.path(), logger)
            .instrument(logger.create_span())
            .await;
        workspace.close();

        let highlights = result?;
        if highlights.is_empty() {
            logger.log_warning("no highlights qualified");
            return Err(PipelineError::NoHighlightsFound);
        }

        metrics::record_highlights_selected(highlights.len());
        logger.log_completion(&format!("{} highlights selected", highlights.len()));
        Ok(highlights)
    }

    async fn run_stages(
        &self,
        video: &Path,
        duration: f64,
        workdir: &Path,
        logger: &RunLogger,
    ) -> PipelineResult<Vec<Highlight>> {
        let interval = self.config.screening.interval_for(duration);

        let started = Instant::now();
        let windows = self.screener.screen(video, duration, interval, workdir).await?;
        metrics::record_stage_duration("screening", started.elapsed().as_secs_f64());
        logger.log_progress(&format!("{} windows forwarded to scoring", windows.len()));

        let started = Instant::now();
        let records = self.scorer.score_all(windows).await;
        metrics::record_stage_duration("scoring", started.elapsed().as_secs_f64());
        logger.log_progress(&format!("{} segments scored", records.len()));

        let started = Instant::now();
        let highlights = self.merger.merge(&records, duration);
        metrics::record_stage_duration("merging", started.elapsed().as_secs_f64());

        for (rank, h) in highlights.iter().enumerate() {
            info!(
                rank,
                span = %h.time_label(),
                weight = h.weight,
                title = %h.title,
                "Highlight selected"
            );
        }
        Ok(highlights)
    }

    /// Cut every highlight into `<output_dir>/short_<i>.mp4`.
    ///
    /// Failed cuts are logged and left out of the result.
    pub async fn cut_segments(&self, video: &Path, highlights: &[Highlight]) -> PipelineResult<Vec<ShortClip>> {
        self.cut_requests(video, highlight_requests(highlights), None).await
    }

    async fn cut_requests(
        &self,
        video: &Path,
        requests: Vec<CutRequest<'_>>,
        duration: Option<f64>,
    ) -> PipelineResult<Vec<ShortClip>> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let started = Instant::now();
        let mut shorts = Vec::with_capacity(requests.len());
        for (index, request) in requests.into_iter().enumerate() {
            let (start, end) = match validate_span(request.start, request.end, duration) {
                Ok(span) => span,
                Err(e) => {
                    warn!(index, error = %e, "Skipping short with invalid span");
                    metrics::record_short_cut(false);
                    continue;
                }
            };

            let output = self.config.output_dir.join(format!("short_{}.mp4", index));
            let span = end - start;
            let cut = cut_clip(video, &output, start, end, move |progress| {
                debug!(
                    index,
                    percent = progress.percentage(span),
                    eta_secs = progress.eta_seconds(span).unwrap_or_default(),
                    "Cut progress"
                );
            })
            .await;

            if let Err(e) = cut {
                warn!(index, start, end, error = %e, "Failed to cut short");
                metrics::record_short_cut(false);
                continue;
            }

            metrics::record_short_cut(true);
            shorts.push(ShortClip {
                index,
                path: output,
                start,
                end,
                title: request.highlight.map(|h| h.title.clone()),
                description: request.highlight.map(|h| h.description.clone()),
                score: request.highlight.map(|h| h.average_score),
            });
        }

        metrics::record_stage_duration("cutting", started.elapsed().as_secs_f64());
        Ok(shorts)
    }

    /// Probe, find, cut, and estimate. Falls back to uniform slices when no
    /// highlight qualifies and the fallback is enabled.
    pub async fn generate_shorts(&self, video: &Path) -> PipelineResult<ShortsOutcome> {
        let duration = get_duration(video).await?;
        self.generate_shorts_with_duration(video, duration).await
    }

    /// [`generate_shorts`](Self::generate_shorts) for a source already probed.
    pub async fn generate_shorts_with_duration(
        &self,
        video: &Path,
        duration: f64,
    ) -> PipelineResult<ShortsOutcome> {
        let logger = RunLogger::new("generate_shorts");

        let (highlights, used_fallback) = match self.find_with_logger(video, duration, &logger).await {
            Ok(highlights) => (highlights, false),
            Err(PipelineError::NoHighlightsFound) if self.config.fallback.enabled => {
                logger.log_warning("falling back to uniform slices");
                metrics::record_fallback();
                (Vec::new(), true)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                return Err(e);
            }
        };

        let shorts = if used_fallback {
            let fallback = &self.config.fallback;
            let requests = uniform_slices(duration, fallback.slice_secs, fallback.min_slice_secs)
                .into_iter()
                .map(|(start, end)| CutRequest {
                    start,
                    end,
                    highlight: None,
                })
                .collect();
            self.cut_requests(video, requests, Some(duration)).await?
        } else {
            self.cut_requests(video, highlight_requests(&highlights), Some(duration))
                .await?
        };
        logger.log_progress(&format!("{} shorts cut", shorts.len()));

        let estimates = self.estimate_all(&shorts).await;

        let outcome = ShortsOutcome {
            run_id: logger.run_id().to_string(),
            source: video.to_path_buf(),
            duration,
            highlights,
            shorts,
            used_fallback,
            estimates,
            usage: self.usage.as_ref().map(|u| u.summary()),
            generated_at: Utc::now(),
        };

        logger.log_completion(&format!(
            "{} shorts{}",
            outcome.shorts.len(),
            if used_fallback { " (fallback)" } else { "" }
        ));
        Ok(outcome)
    }

    async fn estimate_all(&self, shorts: &[ShortClip]) -> Vec<ShortEstimate> {
        let estimator = match (&self.estimator, self.config.estimate_potential) {
            (Some(estimator), true) => estimator,
            _ => return Vec::new(),
        };

        let mut estimates = Vec::with_capacity(shorts.len());
        for short in shorts {
            let estimate = match estimator.estimate_potential(short).await {
                Ok(estimate) => estimate,
                Err(e) => {
                    warn!(index = short.index, error = %e, "Potential estimate failed");
                    ViewEstimate {
                        views: ParsedField::defaulted(DEFAULT_VIEWS),
                        analysis: String::new(),
                    }
                }
            };
            info!(index = short.index, views = estimate.views.get(), "Estimated potential");
            estimates.push(ShortEstimate {
                index: short.index,
                estimate,
            });
        }
        estimates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_outcome_report_is_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let outcome = ShortsOutcome {
            run_id: "run-1".to_string(),
            source: PathBuf::from("input.mp4"),
            duration: 120.0,
            highlights: Vec::new(),
            shorts: vec![ShortClip {
                index: 0,
                path: PathBuf::from("shorts/short_0.mp4"),
                start: 0.0,
                end: 60.0,
                title: None,
                description: None,
                score: None,
            }],
            used_fallback: true,
            estimates: Vec::new(),
            usage: None,
            generated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        let path = dir.path().join("highlights.json");
        outcome.write_json(&path).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["used_fallback"], true);
        assert_eq!(json["shorts"][0]["end"], 60.0);
        assert!(json.get("usage").is_none());
        assert!(json.get("estimates").is_none());
    }
}
