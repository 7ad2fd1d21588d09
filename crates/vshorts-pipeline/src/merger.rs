//! Merging of scored segments into weighted, duration-bounded highlights.
//!
//! A single pass over time-ordered records drives a two-state machine:
//! qualifying records open or extend a candidate, anything else (or the end
//! of the stream) closes it. Closed candidates are padded with context,
//! filtered by duration and weighted, then handed to selection.

use tracing::debug;
use vshorts_models::{sort_by_time, Highlight, SegmentRecord};

use crate::config::MergeConfig;
use crate::metrics;
use crate::selection::sort_by_weight;

const EMOTIONAL_WEIGHT: f64 = 0.3;
const VIRAL_WEIGHT: f64 = 0.3;
const MOTION_WEIGHT: f64 = 0.2;
const AUDIO_WEIGHT: f64 = 0.2;

/// Consecutive qualifying records collected so far.
#[derive(Debug, Clone)]
pub struct HighlightCandidate {
    segments: Vec<SegmentRecord>,
}

impl HighlightCandidate {
    fn open(record: &SegmentRecord) -> Self {
        Self {
            segments: vec![record.clone()],
        }
    }

    fn extend(mut self, record: &SegmentRecord) -> Self {
        self.segments.push(record.clone());
        self
    }

    pub fn first_time(&self) -> f64 {
        self.segments.first().map(|s| s.time).unwrap_or_default()
    }

    pub fn last_time(&self) -> f64 {
        self.segments.last().map(|s| s.time).unwrap_or_default()
    }

    fn mean(&self, field: impl Fn(&SegmentRecord) -> f64) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        self.segments.iter().map(field).sum::<f64>() / self.segments.len() as f64
    }

    /// Longest proposed title; the earliest wins ties.
    fn longest_title(&self) -> String {
        let mut best: Option<&str> = None;
        for segment in &self.segments {
            let longer = best
                .map(|b| segment.title.chars().count() > b.chars().count())
                .unwrap_or(true);
            if longer {
                best = Some(&segment.title);
            }
        }
        best.unwrap_or_default().to_string()
    }

    fn joined_descriptions(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.description.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug)]
enum MergeState {
    Idle,
    Accumulating(HighlightCandidate),
}

/// Why a closed candidate did not become a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    TooShort,
    TooLong,
}

impl DiscardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscardReason::TooShort => "too_short",
            DiscardReason::TooLong => "too_long",
        }
    }
}

/// Merges time-ordered segment records into ranked highlights.
#[derive(Debug, Clone, Default)]
pub struct HighlightMerger {
    config: MergeConfig,
}

impl HighlightMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Full merge: finalize candidates, rank them, select the overlap-free top K.
    pub fn merge(&self, records: &[SegmentRecord], duration: f64) -> Vec<Highlight> {
        let mut finalized = self.finalize_candidates(records, duration);
        sort_by_weight(&mut finalized);

        let selected = self
            .config
            .strategy
            .select(&finalized, self.config.max_shorts);

        debug!(
            candidates = finalized.len(),
            selected = selected.len(),
            strategy = %self.config.strategy,
            "Highlights selected"
        );
        selected
    }

    /// Run the state machine and return every candidate that passed the
    /// duration filter, in time order.
    pub fn finalize_candidates(&self, records: &[SegmentRecord], duration: f64) -> Vec<Highlight> {
        let mut ordered = records.to_vec();
        sort_by_time(&mut ordered);

        let mut finalized = Vec::new();
        let end_state = ordered.iter().fold(MergeState::Idle, |state, record| {
            let qualifies = record.composite_score >= self.config.min_score;
            match (state, qualifies) {
                (MergeState::Idle, false) => MergeState::Idle,
                (MergeState::Idle, true) => {
                    MergeState::Accumulating(HighlightCandidate::open(record))
                }
                (MergeState::Accumulating(candidate), true) => {
                    MergeState::Accumulating(candidate.extend(record))
                }
                (MergeState::Accumulating(candidate), false) => {
                    finalized.extend(self.close(candidate, duration));
                    MergeState::Idle
                }
            }
        });

        if let MergeState::Accumulating(candidate) = end_state {
            finalized.extend(self.close(candidate, duration));
        }

        finalized
    }

    /// Pad, bound and weight a candidate. `None` if its span is out of bounds.
    fn close(&self, candidate: HighlightCandidate, duration: f64) -> Option<Highlight> {
        let start = (candidate.first_time() - self.config.context_secs).max(0.0);
        let end = (candidate.last_time() + self.config.context_secs).min(duration);
        let span = end - start;

        let discard = if span < self.config.min_duration {
            Some(DiscardReason::TooShort)
        } else if span > self.config.max_duration {
            Some(DiscardReason::TooLong)
        } else {
            None
        };

        if let Some(reason) = discard {
            debug!(
                start,
                end,
                segments = candidate.segments.len(),
                reason = reason.as_str(),
                "Candidate discarded"
            );
            metrics::record_candidate_discarded(reason.as_str());
            return None;
        }

        let average_emotional_score = candidate.mean(|s| f64::from(s.emotional_score));
        let average_viral_score = candidate.mean(|s| f64::from(s.viral_score));
        let average_motion = candidate.mean(|s| s.motion_score);
        let average_audio = candidate.mean(|s| s.audio_score);

        Some(Highlight {
            start,
            end,
            duration: span,
            average_score: candidate.mean(|s| s.composite_score),
            average_emotional_score,
            average_viral_score,
            average_motion,
            average_audio,
            title: candidate.longest_title(),
            description: candidate.joined_descriptions(),
            weight: highlight_weight(
                average_emotional_score,
                average_viral_score,
                average_motion,
                average_audio,
            ),
            segment_times: candidate.segments.iter().map(|s| s.time).collect(),
        })
    }
}

/// `0.3 * emotional + 0.3 * viral + 0.2 * motion + 0.2 * audio`.
pub fn highlight_weight(emotional: f64, viral: f64, motion: f64, audio: f64) -> f64 {
    EMOTIONAL_WEIGHT * emotional + VIRAL_WEIGHT * viral + MOTION_WEIGHT * motion + AUDIO_WEIGHT * audio
}
