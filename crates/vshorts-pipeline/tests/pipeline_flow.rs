//! End-to-end highlight search with a scripted extractor and a mocked oracle.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use tempfile::TempDir;
use vshorts_ai::{AiResult, DetailedScore, PreScore, ScoringContext, SemanticScorer};
use vshorts_media::{ExtractedWindow, MediaResult, SignalExtractor, WindowArtifacts};
use vshorts_models::{ParsedField, SignalPair, SignalReading};
use vshorts_pipeline::{is_overlap_free, HighlightPipeline, PipelineConfig, PipelineError};

mock! {
    pub Oracle {}

    #[async_trait]
    impl SemanticScorer for Oracle {
        async fn pre_score(&self, ctx: &ScoringContext) -> AiResult<PreScore>;
        async fn detailed_score(&self, ctx: &ScoringContext) -> AiResult<DetailedScore>;
    }
}

/// Loud, busy windows inside the given spans; quiet everywhere else.
struct ScriptedExtractor {
    active: Vec<(f64, f64)>,
}

#[async_trait]
impl SignalExtractor for ScriptedExtractor {
    async fn extract(
        &self,
        _video: &Path,
        start: f64,
        _length: f64,
        workdir: &Path,
    ) -> MediaResult<ExtractedWindow> {
        let active = self.active.iter().any(|(from, to)| start >= *from && start <= *to);
        let (motion, audio) = if active { (8.0, 7.0) } else { (1.0, 2.0) };

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

fn pre(score: u8) -> PreScore {
    PreScore {
        score: ParsedField::parsed(score),
        reply: score.to_string(),
    }
}

fn detailed(time: f64) -> DetailedScore {
    DetailedScore {
        emotional: ParsedField::parsed(8),
        viral: ParsedField::parsed(8),
        title: ParsedField::parsed(format!("Moment at {}", time)),
        description: format!("Window {}", time),
    }
}

fn config(work_dir: &TempDir, interval: f64) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.screening.interval_override = Some(interval);
    config.screening.max_forwarded = 50;
    config.work_dir = Some(work_dir.path().to_path_buf());
    config.output_dir = work_dir.path().join("shorts");
    config
}

fn generous_oracle() -> MockOracle {
    let mut oracle = MockOracle::new();
    oracle.expect_pre_score().returning(|_| Ok(pre(9)));
    oracle
        .expect_detailed_score()
        .returning(|ctx| Ok(detailed(ctx.time)));
    oracle
}

#[tokio::test]
async fn single_burst_becomes_one_padded_highlight() {
    let work = TempDir::new().unwrap();
    let extractor = Arc::new(ScriptedExtractor {
        active: vec![(10.0, 40.0)],
    });
    let pipeline = HighlightPipeline::new(config(&work, 5.0), extractor, Arc::new(generous_oracle()));

    let highlights = pipeline
        .find_highlights(Path::new("match.mp4"), 60.0)
        .await
        .unwrap();

    assert_eq!(highlights.len(), 1);
    let h = &highlights[0];
    assert_eq!(h.start, 5.0);
    assert_eq!(h.end, 45.0);
    assert_eq!(h.segment_times, vec![10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0]);
    assert!((h.average_score - 25.0 / 3.0).abs() < 1e-9);
    assert_eq!(h.description.lines().count(), 7);

    // Seven windows, two oracle calls each.
    assert_eq!(pipeline.scorer_calls(), 14);

    // The per-run scratch directory is gone.
    let leftovers: Vec<_> = std::fs::read_dir(work.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("vshorts-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn quiet_video_finds_nothing_without_calling_the_oracle() {
    let work = TempDir::new().unwrap();
    let mut oracle = MockOracle::new();
    oracle.expect_pre_score().times(0);
    oracle.expect_detailed_score().times(0);

    let pipeline = HighlightPipeline::new(
        config(&work, 5.0),
        Arc::new(ScriptedExtractor { active: Vec::new() }),
        Arc::new(oracle),
    );

    let err = pipeline
        .find_highlights(Path::new("lecture.mp4"), 120.0)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoHighlightsFound));
}

#[tokio::test]
async fn gated_windows_never_reach_the_detailed_tier() {
    let work = TempDir::new().unwrap();
    let mut oracle = MockOracle::new();
    oracle.expect_pre_score().times(7).returning(|_| Ok(pre(6)));
    oracle.expect_detailed_score().times(0);

    let pipeline = HighlightPipeline::new(
        config(&work, 5.0),
        Arc::new(ScriptedExtractor {
            active: vec![(10.0, 40.0)],
        }),
        Arc::new(oracle),
    );

    let err = pipeline
        .find_highlights(Path::new("match.mp4"), 60.0)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoHighlightsFound));
}

#[tokio::test]
async fn selection_is_bounded_and_overlap_free() {
    let work = TempDir::new().unwrap();
    let bursts = vec![
        (20.0, 40.0),
        (100.0, 130.0),
        (200.0, 210.0),
        (300.0, 340.0),
        (400.0, 420.0),
        (500.0, 525.0),
        (560.0, 590.0),
    ];
    let mut config = config(&work, 5.0);
    config.merge.max_shorts = 4;

    let pipeline = HighlightPipeline::new(
        config,
        Arc::new(ScriptedExtractor { active: bursts }),
        Arc::new(generous_oracle()),
    );

    let highlights = pipeline
        .find_highlights(Path::new("vlog.mp4"), 600.0)
        .await
        .unwrap();

    assert_eq!(highlights.len(), 4);
    assert!(is_overlap_free(&highlights));
    assert!(highlights.windows(2).all(|w| w[0].weight >= w[1].weight));
    for h in &highlights {
        assert!(h.duration >= 15.0 && h.duration <= 60.0);
        assert!(h.start >= 0.0 && h.end <= 600.0);
        assert!(h.segment_times.iter().all(|t| *t >= h.start && *t <= h.end));
    }
}

#[tokio::test]
async fn invalid_duration_aborts_the_run() {
    let work = TempDir::new().unwrap();
    let pipeline = HighlightPipeline::new(
        config(&work, 5.0),
        Arc::new(ScriptedExtractor { active: Vec::new() }),
        Arc::new(MockOracle::new()),
    );

    let err = pipeline
        .find_highlights(Path::new("broken.mp4"), f64::NAN)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidBounds(_)));
}

#[tokio::test]
async fn known_duration_skips_probing_the_source() {
    let work = TempDir::new().unwrap();
    let mut config = config(&work, 5.0);
    config.fallback.enabled = false;

    let pipeline = HighlightPipeline::new(
        config,
        Arc::new(ScriptedExtractor { active: Vec::new() }),
        Arc::new(MockOracle::new()),
    );

    // The file does not exist, so any ffprobe call would fail with a media error.
    let err = pipeline
        .generate_shorts_with_duration(&work.path().join("missing.mp4"), 90.0)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoHighlightsFound));
}
