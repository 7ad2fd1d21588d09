//! `vshorts` command line tool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vshorts_ai::{AiConfig, ChatClient, OpenAiScorer, UsageTracker};
use vshorts_media::{check_ffmpeg, check_ffprobe, probe_video, FfmpegSignalExtractor};
use vshorts_models::{format_seconds, ScoringMode};
use vshorts_pipeline::metrics::init_metrics;
use vshorts_pipeline::{HighlightPipeline, PipelineConfig, SelectionStrategy};

/// Find the most engaging moments of a video and cut them into shorts.
#[derive(Debug, Parser)]
#[command(name = "vshorts", version, about)]
struct Args {
    /// Source video
    video: PathBuf,

    /// Directory for shorts and reports
    #[arg(short, long, env = "VSHORTS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Parent directory for temporary window files
    #[arg(long, env = "VSHORTS_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// two_tier or detailed_only
    #[arg(long)]
    scoring_mode: Option<ScoringMode>,

    /// greedy or max_total_weight
    #[arg(long)]
    selection: Option<SelectionStrategy>,

    #[arg(long)]
    max_shorts: Option<usize>,

    /// Fixed screening window width in seconds
    #[arg(long)]
    interval: Option<f64>,

    /// Attach a still frame to detailed scoring requests
    #[arg(long)]
    frames: bool,

    /// Estimate the view potential of each short
    #[arg(long)]
    estimate: bool,

    /// Upper bound on oracle calls for the run
    #[arg(long)]
    max_scorer_calls: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.work_dir {
            config.work_dir = Some(dir.clone());
        }
        if let Some(mode) = self.scoring_mode {
            config.scoring.mode = mode;
        }
        if let Some(strategy) = self.selection {
            config.merge.strategy = strategy;
        }
        if let Some(max) = self.max_shorts {
            config.merge.max_shorts = max;
        }
        if let Some(interval) = self.interval {
            config.screening.interval_override = Some(interval);
        }
        if self.frames {
            config.screening.capture_frames = true;
        }
        if self.estimate {
            config.estimate_potential = true;
        }
        if let Some(calls) = self.max_scorer_calls {
            config.scoring.max_scorer_calls = Some(calls);
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vshorts=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing()?;

    let metrics_handle = init_metrics().context("failed to install Prometheus recorder")?;

    let mut config = PipelineConfig::from_env()?;
    args.apply(&mut config);
    config.validate()?;
    info!("Pipeline config: {:?}", config);

    check_ffmpeg()?;
    check_ffprobe()?;

    let info = probe_video(&args.video)
        .await
        .with_context(|| format!("failed to probe {}", args.video.display()))?;
    info!(
        duration = %format_seconds(info.duration),
        width = info.width,
        height = info.height,
        has_audio = info.has_audio,
        "Probed source video"
    );
    if !info.has_audio {
        warn!("Source has no audio track; audio signal will read as silence");
    }

    let usage = Arc::new(UsageTracker::new());
    let client = ChatClient::with_usage(AiConfig::from_env()?, usage.clone())?;
    let oracle = Arc::new(OpenAiScorer::new(client));

    let extractor = FfmpegSignalExtractor::new(config.screening.extraction_timeout_secs)
        .with_frames(config.screening.capture_frames)
        .with_audio_track(info.has_audio);

    let output_dir = config.output_dir.clone();
    let pipeline = HighlightPipeline::new(config, Arc::new(extractor), oracle.clone())
        .with_estimator(oracle)
        .with_usage(usage);

    let outcome = pipeline
        .generate_shorts_with_duration(&args.video, info.duration)
        .await?;

    let report = output_dir.join("highlights.json");
    outcome.write_json(&report).await?;
    tokio::fs::write(output_dir.join("metrics.prom"), metrics_handle.render()).await?;

    for short in &outcome.shorts {
        info!(
            index = short.index,
            path = %short.path.display(),
            start = %format_seconds(short.start),
            end = %format_seconds(short.end),
            title = short.title.as_deref().unwrap_or("-"),
            "Short ready"
        );
    }
    if let Some(summary) = &outcome.usage {
        info!(
            requests = summary.requests,
            total_tokens = summary.total_tokens,
            total_cost = %format!("${:.4}", summary.total_cost),
            "Oracle usage"
        );
    }
    info!(
        shorts = outcome.shorts.len(),
        fallback = outcome.used_fallback,
        report = %report.display(),
        "Done"
    );
    Ok(())
}
