#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the highlight pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Timeouts for every spawned process
//! - Window extraction (sub-clip, audio track, still frame) and final cuts
//! - Motion and loudness signal extraction behind the `SignalExtractor` trait

pub mod clip;
pub mod command;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod signals;

pub use clip::{cut_clip, extract_audio, extract_frame, extract_segment};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{release_paths, remove_quietly};
pub use probe::{get_duration, probe_video, VideoInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use signals::{
    ExtractedWindow, FfmpegSignalExtractor, SignalExtractor, WindowArtifacts,
};
