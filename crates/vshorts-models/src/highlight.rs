//! Finalized highlight and short-clip models.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::{format_seconds, TimePoint};

/// A finalized, duration-bounded span selected from the scored segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Highlight {
    /// Span start in seconds (context padding included)
    pub start: TimePoint,
    /// Span end in seconds (context padding included)
    pub end: TimePoint,
    /// `end - start`
    pub duration: f64,
    /// Mean composite score of the contributing segments
    pub average_score: f64,
    pub average_emotional_score: f64,
    pub average_viral_score: f64,
    pub average_motion: f64,
    pub average_audio: f64,
    /// Longest title proposed by the contributing segments
    pub title: String,
    /// Contributing descriptions joined in time order
    pub description: String,
    /// Ranking weight (0..10)
    pub weight: f64,
    /// Start times of the contributing segments
    pub segment_times: Vec<TimePoint>,
}

impl Highlight {
    /// Open-interval overlap test against another highlight.
    pub fn overlaps(&self, other: &Highlight) -> bool {
        spans_overlap(self.start, self.end, other.start, other.end)
    }

    /// Human readable `HH:MM:SS - HH:MM:SS` label.
    pub fn time_label(&self) -> String {
        format!("{} - {}", format_seconds(self.start), format_seconds(self.end))
    }
}

/// `true` when `[a_start, a_end)` and `[b_start, b_end)` share any time.
///
/// Spans that only touch at an endpoint do not overlap.
pub fn spans_overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
    a_start < b_end && a_end > b_start
}

/// A short cut from the source video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShortClip {
    /// Position in the output set (0-indexed)
    pub index: usize,
    pub path: PathBuf,
    pub start: TimePoint,
    pub end: TimePoint,
    /// Highlight title, absent for uniform slices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Mean composite score of the source highlight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl ShortClip {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
