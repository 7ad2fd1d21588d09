//! Shared data models for the vshorts highlight pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Signal readings produced by the media extractor
//! - Per-window segment records produced by semantic scoring
//! - Finalized highlights and cut shorts
//! - Oracle fields that remember whether they were parsed or defaulted

pub mod highlight;
pub mod parsed;
pub mod segment;
pub mod signal;
pub mod timestamp;

// Re-export common types
pub use highlight::{spans_overlap, Highlight, ShortClip};
pub use parsed::{FieldSource, ParsedField};
pub use segment::{sort_by_time, ScoringMode, SegmentRecord};
pub use signal::{SignalKind, SignalPair, SignalReading};
pub use timestamp::{format_seconds, validate_duration, validate_span, TimePoint, TimestampError};
