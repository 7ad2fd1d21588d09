//! Coarse signal screening of the source timeline.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use vshorts_media::{release_paths, SignalExtractor, WindowArtifacts};
use vshorts_models::{validate_duration, SignalPair};

use crate::config::ScreeningConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// A window that survived screening, with the artifacts it still owns.
#[derive(Debug, Clone)]
pub struct ScreenedWindow {
    pub time: f64,
    pub length: f64,
    pub signals: SignalPair,
    /// Mean of motion intensity and audio volume
    pub initial_score: f64,
    pub artifacts: WindowArtifacts,
}

impl ScreenedWindow {
    pub fn frame(&self) -> Option<&Path> {
        self.artifacts.frame.as_deref()
    }

    /// Delete this window's artifacts.
    pub async fn release(&self) -> usize {
        self.artifacts.release().await
    }
}

/// Delete the artifacts of every window in `windows`.
pub async fn release_windows(windows: &[ScreenedWindow]) -> usize {
    release_paths(windows.iter().flat_map(|w| w.artifacts.paths())).await
}

/// `(start, length)` of every window; the last one may be shorter.
pub fn window_starts(duration: f64, interval: f64) -> Vec<(f64, f64)> {
    let mut windows = Vec::new();
    let mut index = 0u32;
    loop {
        let start = f64::from(index) * interval;
        if start >= duration {
            break;
        }
        windows.push((start, interval.min(duration - start)));
        index += 1;
    }
    windows
}

/// Walks the timeline window by window and keeps the high-signal ones.
pub struct Screener {
    extractor: Arc<dyn SignalExtractor>,
    config: ScreeningConfig,
}

impl Screener {
    pub fn new(extractor: Arc<dyn SignalExtractor>, config: ScreeningConfig) -> Self {
        Self { extractor, config }
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    /// Whether a window is worth a semantic score.
    pub fn is_retained(&self, signals: &SignalPair) -> bool {
        signals.intensity() > self.config.retain_threshold
            || signals.volume() > self.config.retain_threshold
    }

    /// Screen `video` in windows of `interval` seconds.
    ///
    /// Returns at most `max_forwarded` windows ordered by descending initial
    /// score (earlier time first on ties). Artifacts of every window not
    /// returned are already deleted.
    pub async fn screen(
        &self,
        video: &Path,
        duration: f64,
        interval: f64,
        workdir: &Path,
    ) -> PipelineResult<Vec<ScreenedWindow>> {
        let duration = validate_duration(duration)?;
        if !(interval.is_finite() && interval > 0.0) {
            return Err(PipelineError::invalid_bounds(format!(
                "window interval must be positive, got {}",
                interval
            )));
        }

        let starts = window_starts(duration, interval);
        info!(
            windows = starts.len(),
            interval,
            duration,
            "Screening video: {}",
            video.display()
        );

        let mut retained = Vec::new();
        let mut failed = 0usize;
        for (time, length) in starts {
            let extracted = match self.extractor.extract(video, time, length, workdir).await {
                Ok(extracted) => extracted,
                Err(e) => {
                    let err = PipelineError::extraction_failure(time, e.to_string());
                    warn!(time, error = %err, "Skipping window");
                    metrics::record_windows("failed", 1);
                    failed += 1;
                    continue;
                }
            };

            if !self.is_retained(&extracted.signals) {
                debug!(
                    time,
                    intensity = extracted.signals.intensity(),
                    volume = extracted.signals.volume(),
                    "Window rejected"
                );
                extracted.artifacts.release().await;
                metrics::record_windows("rejected", 1);
                continue;
            }

            metrics::record_windows("retained", 1);
            retained.push(ScreenedWindow {
                time,
                length,
                initial_score: extracted.signals.initial_score(),
                signals: extracted.signals,
                artifacts: extracted.artifacts,
            });
        }

        retained.sort_by(|a, b| b.initial_score.total_cmp(&a.initial_score));

        if retained.len() > self.config.max_forwarded {
            let capped = retained.split_off(self.config.max_forwarded);
            metrics::record_windows("capped", capped.len());
            let removed = release_windows(&capped).await;
            debug!(capped = capped.len(), removed, "Released windows beyond the cap");
        }

        info!(
            forwarded = retained.len(),
            failed,
            "Screening finished"
        );
        Ok(retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use vshorts_media::{ExtractedWindow, MediaError, MediaResult};
    use vshorts_models::SignalReading;

    /// Returns canned signals per window start and writes a real clip file.
    struct FakeExtractor {
        readings: HashMap<u64, (f64, f64)>,
        fail_at: Vec<u64>,
        calls: Mutex<Vec<f64>>,
    }

    impl FakeExtractor {
        fn new(readings: &[(f64, f64, f64)]) -> Self {
            Self {
                readings: readings
                    .iter()
                    .map(|(t, m, a)| (*t as u64, (*m, *a)))
                    .collect(),
                fail_at: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_at(mut self, time: f64) -> Self {
            self.fail_at.push(time as u64);
            self
        }
    }

    #[async_trait]
    impl SignalExtractor for FakeExtractor {
        async fn extract(
            &self,
            _video: &Path,
            start: f64,
            _length: f64,
            workdir: &Path,
        ) -> MediaResult<ExtractedWindow> {
            self.calls.lock().unwrap().push(start);
            if self.fail_at.contains(&(start as u64)) {
                return Err(MediaError::analysis_failed("decoder error"));
            }
            let (motion, audio) = self.readings.get(&(start as u64)).copied().unwrap_or((0.0, 0.0));
            let clip = workdir.join(format!("window_{:07}.mp4", (start * 1000.0) as u64));
            tokio::fs::write(&clip, b"clip").await?;
            Ok(ExtractedWindow {
                signals: SignalPair::new(SignalReading::motion(motion), SignalReading::audio(audio)),
                artifacts: WindowArtifacts {
                    clip,
                    audio: None,
                    frame: None,
                },
            })
        }
    }

    fn clip_path(dir: &Path, time: f64) -> PathBuf {
        dir.join(format!("window_{:07}.mp4", (time * 1000.0) as u64))
    }

    #[test]
    fn test_window_starts_last_window_is_short() {
        let windows = window_starts(10.0, 3.0);
        assert_eq!(windows, vec![(0.0, 3.0), (3.0, 3.0), (6.0, 3.0), (9.0, 1.0)]);
    }

    #[test]
    fn test_window_starts_exact_multiple() {
        assert_eq!(window_starts(9.0, 3.0).len(), 3);
    }

    #[tokio::test]
    async fn test_low_signal_windows_are_rejected_and_released() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(FakeExtractor::new(&[
            (0.0, 2.0, 3.0),
            (3.0, 4.0, 0.0),
            (6.0, 0.0, 8.0),
        ]));
        let screener = Screener::new(extractor, ScreeningConfig::default());

        let windows = screener
            .screen(Path::new("in.mp4"), 9.0, 3.0, dir.path())
            .await
            .unwrap();

        let times: Vec<f64> = windows.iter().map(|w| w.time).collect();
        assert_eq!(times, vec![6.0, 3.0]);
        assert!(!clip_path(dir.path(), 0.0).exists());
        assert!(clip_path(dir.path(), 3.0).exists());
    }

    #[tokio::test]
    async fn test_ranking_is_stable_and_capped() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(FakeExtractor::new(&[
            (0.0, 5.0, 5.0),
            (3.0, 9.0, 9.0),
            (6.0, 5.0, 5.0),
            (9.0, 4.0, 4.0),
        ]));
        let config = ScreeningConfig {
            max_forwarded: 2,
            ..Default::default()
        };
        let screener = Screener::new(extractor, config);

        let windows = screener
            .screen(Path::new("in.mp4"), 12.0, 3.0, dir.path())
            .await
            .unwrap();

        let times: Vec<f64> = windows.iter().map(|w| w.time).collect();
        assert_eq!(times, vec![3.0, 0.0]);
        assert_eq!(windows[0].initial_score, 9.0);
        assert!(!clip_path(dir.path(), 6.0).exists());
        assert!(!clip_path(dir.path(), 9.0).exists());
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_window() {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(
            FakeExtractor::new(&[(0.0, 8.0, 8.0), (3.0, 8.0, 8.0), (6.0, 8.0, 8.0)])
                .failing_at(3.0),
        );
        let screener = Screener::new(extractor.clone(), ScreeningConfig::default());

        let windows = screener
            .screen(Path::new("in.mp4"), 9.0, 3.0, dir.path())
            .await
            .unwrap();

        assert_eq!(windows.len(), 2);
        assert_eq!(extractor.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_duration_is_rejected() {
        let dir = TempDir::new().unwrap();
        let screener = Screener::new(Arc::new(FakeExtractor::new(&[])), ScreeningConfig::default());

        for duration in [0.0, f64::NAN] {
            let err = screener
                .screen(Path::new("in.mp4"), duration, 3.0, dir.path())
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::InvalidBounds(_)));
        }
    }
}
