//! Per-window scoring records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::signal::SignalPair;
use crate::timestamp::TimePoint;

/// How a run turns oracle scores into the composite acceptance score.
///
/// A run uses exactly one mode; records produced under different modes are
/// not comparable and must not be merged together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Cheap pre-score gates the detailed score;
    /// composite = (emotional + viral + pre_score) / 3.
    #[default]
    TwoTier,
    /// Detailed score only; composite = (emotional + viral) / 2.
    DetailedOnly,
}

impl ScoringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMode::TwoTier => "two_tier",
            ScoringMode::DetailedOnly => "detailed_only",
        }
    }

    /// Whether this mode asks the oracle for a pre-score.
    pub fn uses_pre_score(&self) -> bool {
        matches!(self, ScoringMode::TwoTier)
    }

    /// Composite acceptance score for one window.
    ///
    /// In `TwoTier` mode a missing pre-score degrades to the two-score mean.
    pub fn composite(&self, emotional: u8, viral: u8, pre_score: Option<u8>) -> f64 {
        let e = f64::from(emotional);
        let v = f64::from(viral);
        match (self, pre_score) {
            (ScoringMode::TwoTier, Some(pre)) => (e + v + f64::from(pre)) / 3.0,
            _ => (e + v) / 2.0,
        }
    }
}

impl std::str::FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "two_tier" | "two-tier" | "twotier" => Ok(ScoringMode::TwoTier),
            "detailed_only" | "detailed-only" | "detailed" => Ok(ScoringMode::DetailedOnly),
            other => Err(format!("unknown scoring mode: {}", other)),
        }
    }
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified result of scoring one window.
///
/// Created once and never mutated afterwards. The merger expects a sequence of
/// these ordered by ascending `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentRecord {
    /// Window start in seconds
    pub time: TimePoint,
    /// Emotional response (1..10)
    pub emotional_score: u8,
    /// Viral potential (1..10)
    pub viral_score: u8,
    /// Cheap pre-score (1..10), absent in detailed-only runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_score: Option<u8>,
    pub title: String,
    /// Oracle justification text
    pub description: String,
    /// Motion intensity (0..10)
    pub motion_score: f64,
    /// Audio volume (0..10)
    pub audio_score: f64,
    /// Acceptance score, see [`ScoringMode::composite`]
    pub composite_score: f64,
}

impl SegmentRecord {
    /// Build a record, computing the composite under `mode`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time: TimePoint,
        signals: &SignalPair,
        emotional_score: u8,
        viral_score: u8,
        pre_score: Option<u8>,
        title: impl Into<String>,
        description: impl Into<String>,
        mode: ScoringMode,
    ) -> Self {
        Self {
            time,
            emotional_score,
            viral_score,
            pre_score,
            title: title.into(),
            description: description.into(),
            motion_score: signals.intensity(),
            audio_score: signals.volume(),
            composite_score: mode.composite(emotional_score, viral_score, pre_score),
        }
    }
}

/// Sort records into the ascending-time order the merger relies on.
pub fn sort_by_time(records: &mut [SegmentRecord]) {
    records.sort_by(|a, b| a.time.total_cmp(&b.time));
}
