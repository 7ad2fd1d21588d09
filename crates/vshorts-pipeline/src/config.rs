//! Pipeline configuration.
//!
//! Defaults reproduce the reference tuning; every knob can be overridden
//! through `VSHORTS_*` environment variables or CLI flags.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vshorts_models::ScoringMode;

use crate::error::{PipelineError, PipelineResult};
use crate::selection::SelectionStrategy;

/// Coarse screening of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Fixed window width; `None` picks one from the video duration
    pub interval_override: Option<f64>,
    /// Videos up to this length use `short_interval`
    pub short_video_secs: f64,
    /// Videos up to this length use `medium_interval`
    pub medium_video_secs: f64,
    pub short_interval: f64,
    pub medium_interval: f64,
    pub long_interval: f64,
    /// A window is kept when either signal is strictly above this
    pub retain_threshold: f64,
    /// Windows forwarded to semantic scoring
    pub max_forwarded: usize,
    /// Hard timeout for each FFmpeg call during extraction
    pub extraction_timeout_secs: u64,
    /// Attach a still frame to the detailed score
    pub capture_frames: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            interval_override: None,
            short_video_secs: 600.0,
            medium_video_secs: 1800.0,
            short_interval: 3.0,
            medium_interval: 5.0,
            long_interval: 10.0,
            retain_threshold: 3.0,
            max_forwarded: 10,
            extraction_timeout_secs: 120,
            capture_frames: false,
        }
    }
}

impl ScreeningConfig {
    /// Window width for a video of `duration` seconds.
    pub fn interval_for(&self, duration: f64) -> f64 {
        if let Some(interval) = self.interval_override {
            return interval;
        }
        if duration <= self.short_video_secs {
            self.short_interval
        } else if duration <= self.medium_video_secs {
            self.medium_interval
        } else {
            self.long_interval
        }
    }
}

/// Two-tier semantic scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub mode: ScoringMode,
    /// Pre-scores below this never reach the detailed tier
    pub pre_score_gate: u8,
    /// Total oracle calls allowed in one run
    pub max_scorer_calls: Option<u64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::TwoTier,
            pre_score_gate: 7,
            max_scorer_calls: None,
        }
    }
}

/// Merging, duration filtering and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Padding added before the first and after the last segment
    pub context_secs: f64,
    /// Composite score a segment needs to join a highlight
    pub min_score: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub max_shorts: usize,
    pub strategy: SelectionStrategy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            context_secs: 5.0,
            min_score: 7.0,
            min_duration: 15.0,
            max_duration: 60.0,
            max_shorts: 5,
            strategy: SelectionStrategy::Greedy,
        }
    }
}

/// Uniform slicing used when no highlight qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub slice_secs: f64,
    /// Trailing slices shorter than this are dropped
    pub min_slice_secs: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slice_secs: 60.0,
            min_slice_secs: 15.0,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub screening: ScreeningConfig,
    pub scoring: ScoringConfig,
    pub merge: MergeConfig,
    pub fallback: FallbackConfig,
    /// Parent directory for per-run scratch space (system temp dir if unset)
    pub work_dir: Option<PathBuf>,
    /// Where shorts and reports are written
    pub output_dir: PathBuf,
    /// Ask the oracle for a view estimate of every short
    pub estimate_potential: bool,
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let mut config = Self {
            output_dir: PathBuf::from("shorts"),
            ..Default::default()
        };

        let screening = &mut config.screening;
        if let Some(interval) = env_parse::<f64>("VSHORTS_INTERVAL_SECS")? {
            screening.interval_override = Some(interval);
        }
        if let Some(max) = env_parse("VSHORTS_MAX_WINDOWS")? {
            screening.max_forwarded = max;
        }
        if let Some(threshold) = env_parse("VSHORTS_RETAIN_THRESHOLD")? {
            screening.retain_threshold = threshold;
        }
        if let Some(timeout) = env_parse("VSHORTS_EXTRACTION_TIMEOUT_SECS")? {
            screening.extraction_timeout_secs = timeout;
        }
        if let Some(frames) = env_flag("VSHORTS_CAPTURE_FRAMES") {
            screening.capture_frames = frames;
        }

        let scoring = &mut config.scoring;
        if let Some(mode) = env_parse("VSHORTS_SCORING_MODE")? {
            scoring.mode = mode;
        }
        if let Some(gate) = env_parse("VSHORTS_PRE_SCORE_GATE")? {
            scoring.pre_score_gate = gate;
        }
        if let Some(calls) = env_parse("VSHORTS_MAX_SCORER_CALLS")? {
            scoring.max_scorer_calls = Some(calls);
        }

        let merge = &mut config.merge;
        if let Some(context) = env_parse("VSHORTS_CONTEXT_SECS")? {
            merge.context_secs = context;
        }
        if let Some(score) = env_parse("VSHORTS_MIN_SCORE")? {
            merge.min_score = score;
        }
        if let Some(min) = env_parse("VSHORTS_MIN_DURATION_SECS")? {
            merge.min_duration = min;
        }
        if let Some(max) = env_parse("VSHORTS_MAX_DURATION_SECS")? {
            merge.max_duration = max;
        }
        if let Some(max) = env_parse("VSHORTS_MAX_SHORTS")? {
            merge.max_shorts = max;
        }
        if let Some(strategy) = env_parse("VSHORTS_SELECTION")? {
            merge.strategy = strategy;
        }

        if let Some(enabled) = env_flag("VSHORTS_FALLBACK") {
            config.fallback.enabled = enabled;
        }
        if let Ok(dir) = std::env::var("VSHORTS_WORK_DIR") {
            config.work_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = std::env::var("VSHORTS_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(estimate) = env_flag("VSHORTS_ESTIMATE_POTENTIAL") {
            config.estimate_potential = estimate;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the pipeline meaningless.
    pub fn validate(&self) -> PipelineResult<()> {
        let s = &self.screening;
        for interval in [s.short_interval, s.medium_interval, s.long_interval]
            .into_iter()
            .chain(s.interval_override)
        {
            if !(interval.is_finite() && interval > 0.0) {
                return Err(PipelineError::config(format!(
                    "window interval must be positive, got {}",
                    interval
                )));
            }
        }
        if s.max_forwarded == 0 {
            return Err(PipelineError::config("max_forwarded must be at least 1"));
        }

        if !(1..=10).contains(&self.scoring.pre_score_gate) {
            return Err(PipelineError::config("pre_score_gate must be within 1..=10"));
        }

        let m = &self.merge;
        if !(m.context_secs.is_finite() && m.context_secs >= 0.0) {
            return Err(PipelineError::config("context_secs must be non-negative"));
        }
        if !(m.min_duration > 0.0 && m.min_duration <= m.max_duration) {
            return Err(PipelineError::config(format!(
                "duration bounds are inconsistent: {}..{}",
                m.min_duration, m.max_duration
            )));
        }
        if m.max_shorts == 0 {
            return Err(PipelineError::config("max_shorts must be at least 1"));
        }

        let f = &self.fallback;
        if f.enabled && !(f.slice_secs > 0.0 && f.min_slice_secs <= f.slice_secs) {
            return Err(PipelineError::config("fallback slice lengths are inconsistent"));
        }

        Ok(())
    }
}

fn env_parse<T>(key: &str) -> PipelineResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PipelineError::config(format!("{}={}: {}", key, raw, e))),
        _ => Ok(None),
    }
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_interval() {
        let screening = ScreeningConfig::default();
        assert_eq!(screening.interval_for(120.0), 3.0);
        assert_eq!(screening.interval_for(600.0), 3.0);
        assert_eq!(screening.interval_for(601.0), 5.0);
        assert_eq!(screening.interval_for(1800.0), 5.0);
        assert_eq!(screening.interval_for(7200.0), 10.0);
    }

    #[test]
    fn test_interval_override_wins() {
        let screening = ScreeningConfig {
            interval_override: Some(15.0),
            ..Default::default()
        };
        assert_eq!(screening.interval_for(120.0), 15.0);
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.merge.max_shorts, 5);
        assert_eq!(config.scoring.pre_score_gate, 7);
        assert_eq!(config.scoring.mode, ScoringMode::TwoTier);
    }

    #[test]
    fn test_validate_rejects_inverted_duration_bounds() {
        let mut config = PipelineConfig::default();
        config.merge.min_duration = 90.0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = PipelineConfig::default();
        config.screening.interval_override = Some(0.0);
        assert!(config.validate().is_err());
    }
}
