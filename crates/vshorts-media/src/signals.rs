//! Motion and loudness extraction for analysis windows.
//!
//! Motion is the number of scene changes FFmpeg's `select='gt(scene,0.1)'`
//! filter reports inside the window, scaled to 0..10. Loudness is the
//! `volumedetect` peak mapped from -70..0 dB onto 0..10.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use vshorts_models::{SignalPair, SignalReading};

use crate::clip::{extract_audio, extract_frame, extract_segment};
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::fs_utils::{release_paths, remove_quietly};

/// Scene-change threshold for the `select` filter.
pub const SCENE_THRESHOLD: f64 = 0.1;

/// Peak volume assumed when `volumedetect` reports nothing.
pub const SILENCE_FLOOR_DB: f64 = -70.0;

/// Default per-command timeout for window extraction.
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 120;

const SCENE_SCORE_MARKER: &str = "lavfi.scene_score=";
const MAX_VOLUME_MARKER: &str = "max_volume:";

/// Temporary files produced while analyzing one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowArtifacts {
    /// Stream-copied sub-clip of the window
    pub clip: PathBuf,
    /// Mono analysis track, absent for videos without audio
    pub audio: Option<PathBuf>,
    /// Still frame for the oracle, when frame capture is enabled
    pub frame: Option<PathBuf>,
}

impl WindowArtifacts {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.clip)
            .chain(self.audio.iter())
            .chain(self.frame.iter())
    }

    /// Delete every artifact. Returns the number of files removed.
    pub async fn release(&self) -> usize {
        release_paths(self.paths()).await
    }
}

/// Signals plus the artifacts the caller now owns.
#[derive(Debug, Clone)]
pub struct ExtractedWindow {
    pub signals: SignalPair,
    pub artifacts: WindowArtifacts,
}

/// Source of motion/audio readings for a window of the source video.
#[async_trait]
pub trait SignalExtractor: Send + Sync {
    /// Analyze `[start, start + length)` of `video`, writing artifacts under `workdir`.
    ///
    /// On error no artifacts are left behind.
    async fn extract(
        &self,
        video: &Path,
        start: f64,
        length: f64,
        workdir: &Path,
    ) -> MediaResult<ExtractedWindow>;
}

/// [`SignalExtractor`] backed by the FFmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegSignalExtractor {
    runner: FfmpegRunner,
    capture_frames: bool,
    has_audio: bool,
}

impl Default for FfmpegSignalExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACTION_TIMEOUT_SECS)
    }
}

impl FfmpegSignalExtractor {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(timeout_secs),
            capture_frames: false,
            has_audio: true,
        }
    }

    /// Also extract a still frame per window.
    pub fn with_frames(mut self, capture_frames: bool) -> Self {
        self.capture_frames = capture_frames;
        self
    }

    /// Whether the source carries an audio stream.
    pub fn with_audio_track(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }

    fn artifacts_for(&self, start: f64, workdir: &Path) -> WindowArtifacts {
        let stem = window_stem(start);
        WindowArtifacts {
            clip: workdir.join(format!("{}.mp4", stem)),
            audio: self
                .has_audio
                .then(|| workdir.join(format!("{}.wav", stem))),
            frame: self
                .capture_frames
                .then(|| workdir.join(format!("{}.jpg", stem))),
        }
    }

    async fn audio_reading(&self, clip: &Path, track: Option<&Path>) -> MediaResult<SignalReading> {
        let Some(track) = track else {
            return Ok(SignalReading::audio(0.0).with_description("No audio track"));
        };
        extract_audio(clip, track, &self.runner).await?;
        analyze_audio(track, &self.runner).await
    }

    async fn extract_into(
        &self,
        video: &Path,
        start: f64,
        length: f64,
        artifacts: &mut WindowArtifacts,
    ) -> MediaResult<SignalPair> {
        extract_segment(video, &artifacts.clip, start, length, &self.runner).await?;

        let clip = artifacts.clip.as_path();
        let track = artifacts.audio.as_deref();
        let (motion, audio) = tokio::join!(
            analyze_motion(clip, &self.runner),
            self.audio_reading(clip, track)
        );
        let signals = SignalPair::new(motion?, audio?);

        if let Some(frame) = artifacts.frame.clone() {
            if let Err(e) = extract_frame(clip, &frame, &self.runner).await {
                warn!(time = start, error = %e, "Frame extraction failed, scoring without frame");
                remove_quietly(&frame).await;
                artifacts.frame = None;
            }
        }

        Ok(signals)
    }
}

#[async_trait]
impl SignalExtractor for FfmpegSignalExtractor {
    async fn extract(
        &self,
        video: &Path,
        start: f64,
        length: f64,
        workdir: &Path,
    ) -> MediaResult<ExtractedWindow> {
        let mut artifacts = self.artifacts_for(start, workdir);

        match self.extract_into(video, start, length, &mut artifacts).await {
            Ok(signals) => {
                debug!(
                    time = start,
                    motion = signals.intensity(),
                    audio = signals.volume(),
                    "Extracted window signals"
                );
                Ok(ExtractedWindow { signals, artifacts })
            }
            Err(e) => {
                artifacts.release().await;
                Err(e)
            }
        }
    }
}

/// Count scene changes in the window clip.
pub async fn analyze_motion(clip: &Path, runner: &FfmpegRunner) -> MediaResult<SignalReading> {
    let cmd = FfmpegCommand::analysis(clip)
        .video_filter(format!("select='gt(scene,{})',metadata=print", SCENE_THRESHOLD))
        .output_arg("-an")
        .null_format();

    let stderr = runner.run_capture(&cmd).await?;
    let changes = count_scene_changes(&stderr);
    Ok(SignalReading::motion(motion_intensity(changes)))
}

/// Measure the peak volume of an audio track.
pub async fn analyze_audio(track: &Path, runner: &FfmpegRunner) -> MediaResult<SignalReading> {
    let cmd = FfmpegCommand::analysis(track)
        .audio_filter("volumedetect")
        .null_format();

    let stderr = runner.run_capture(&cmd).await?;
    let peak_db = parse_max_volume(&stderr).unwrap_or(SILENCE_FLOOR_DB);
    Ok(SignalReading::audio(normalize_volume(peak_db)))
}

/// Number of frames the scene filter let through.
pub fn count_scene_changes(stderr: &str) -> usize {
    stderr
        .lines()
        .filter(|line| line.contains(SCENE_SCORE_MARKER))
        .count()
}

/// `min(ceil(changes * 2), 10)`.
pub fn motion_intensity(scene_changes: usize) -> f64 {
    (scene_changes as f64 * 2.0).ceil().min(10.0)
}

/// Peak volume in dB from `volumedetect` output.
pub fn parse_max_volume(stderr: &str) -> Option<f64> {
    stderr.lines().find_map(|line| {
        let (_, rest) = line.split_once(MAX_VOLUME_MARKER)?;
        rest.trim().trim_end_matches("dB").trim().parse::<f64>().ok()
    })
}

/// Map a -70..0 dB peak onto 0..10.
pub fn normalize_volume(peak_db: f64) -> f64 {
    ((peak_db - SILENCE_FLOOR_DB) / -SILENCE_FLOOR_DB * 10.0).clamp(0.0, 10.0)
}

fn window_stem(start: f64) -> String {
    format!("window_{:07}", (start.max(0.0) * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCENE_LOG: &str = "\
[Parsed_select_0 @ 0x55d1] frame:0 pts:12 pts_time:0.48
[Parsed_metadata_1 @ 0x55d1] frame:0    pts:12      pts_time:0.48
[Parsed_metadata_1 @ 0x55d1] lavfi.scene_score=0.412
[Parsed_metadata_1 @ 0x55d1] frame:1    pts:40      pts_time:1.6
[Parsed_metadata_1 @ 0x55d1] lavfi.scene_score=0.187
frame=   75 fps=0.0 q=-0.0 Lsize=N/A time=00:00:03.00 bitrate=N/A speed= 112x";

    const VOLUME_LOG: &str = "\
[Parsed_volumedetect_0 @ 0x5581] n_samples: 48000
[Parsed_volumedetect_0 @ 0x5581] mean_volume: -27.3 dB
[Parsed_volumedetect_0 @ 0x5581] max_volume: -7.0 dB
[Parsed_volumedetect_0 @ 0x5581] histogram_7db: 12";

    #[test]
    fn test_count_scene_changes() {
        assert_eq!(count_scene_changes(SCENE_LOG), 2);
        assert_eq!(count_scene_changes(""), 0);
    }

    #[test]
    fn test_motion_intensity_caps_at_ten() {
        assert_eq!(motion_intensity(0), 0.0);
        assert_eq!(motion_intensity(2), 4.0);
        assert_eq!(motion_intensity(5), 10.0);
        assert_eq!(motion_intensity(40), 10.0);
    }

    #[test]
    fn test_parse_max_volume() {
        assert_eq!(parse_max_volume(VOLUME_LOG), Some(-7.0));
        assert_eq!(parse_max_volume("mean_volume: -20.0 dB"), None);
    }

    #[test]
    fn test_normalize_volume() {
        assert!((normalize_volume(-7.0) - 9.0).abs() < 1e-9);
        assert_eq!(normalize_volume(0.0), 10.0);
        assert_eq!(normalize_volume(-70.0), 0.0);
        assert_eq!(normalize_volume(-91.0), 0.0);
        assert_eq!(normalize_volume(3.0), 10.0);
    }

    #[test]
    fn test_artifact_layout() {
        let dir = TempDir::new().unwrap();
        let extractor = FfmpegSignalExtractor::default().with_frames(true);
        let artifacts = extractor.artifacts_for(12.5, dir.path());

        assert_eq!(artifacts.clip, dir.path().join("window_0012500.mp4"));
        assert_eq!(artifacts.audio, Some(dir.path().join("window_0012500.wav")));
        assert_eq!(artifacts.frame, Some(dir.path().join("window_0012500.jpg")));
        assert_eq!(artifacts.paths().count(), 3);

        let silent = FfmpegSignalExtractor::default().with_audio_track(false);
        let artifacts = silent.artifacts_for(0.0, dir.path());
        assert!(artifacts.audio.is_none());
        assert!(artifacts.frame.is_none());
        assert_eq!(artifacts.paths().count(), 1);
    }

    #[tokio::test]
    async fn test_release_removes_existing_artifacts() {
        let dir = TempDir::new().unwrap();
        let artifacts = FfmpegSignalExtractor::default().artifacts_for(3.0, dir.path());
        std::fs::write(&artifacts.clip, b"clip").unwrap();

        assert_eq!(artifacts.release().await, 1);
        assert!(!artifacts.clip.exists());
    }
}
