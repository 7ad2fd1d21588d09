//! Highlight-selection pipeline.
//!
//! Stages, in order:
//! - [`Screener`]: fixed-width windows, motion/audio signals, low-signal rejection, ranking
//! - [`SegmentScorer`]: cheap pre-score gate in front of the detailed oracle score
//! - [`HighlightMerger`]: contiguous qualifying segments merged into padded,
//!   duration-bounded highlights, then overlap-free top-K selection
//!
//! [`HighlightPipeline`] wires the stages together and cuts the results.

pub mod config;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod merger;
pub mod metrics;
pub mod pipeline;
pub mod screener;
pub mod segment_scorer;
pub mod selection;
pub mod workspace;

pub use config::{FallbackConfig, MergeConfig, PipelineConfig, ScoringConfig, ScreeningConfig};
pub use error::{PipelineError, PipelineResult};
pub use fallback::uniform_slices;
pub use logging::RunLogger;
pub use merger::{highlight_weight, DiscardReason, HighlightCandidate, HighlightMerger};
pub use pipeline::{HighlightPipeline, ShortEstimate, ShortsOutcome};
pub use screener::{release_windows, window_starts, ScreenedWindow, Screener};
pub use segment_scorer::SegmentScorer;
pub use selection::{is_overlap_free, select_greedy, select_max_total_weight, SelectionStrategy};
pub use workspace::RunWorkspace;
