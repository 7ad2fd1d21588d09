//! Stream-copy cutting and per-window extraction.
//!
//! Nothing here re-encodes video. Window sub-clips and final shorts are cut
//! with `-c copy`, so cut points snap to keyframes the way FFmpeg decides.

use std::path::Path;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Sample rate of the extracted analysis audio track.
pub const ANALYSIS_SAMPLE_RATE: u32 = 16_000;

/// Hard timeout for cutting one short.
pub const CUT_TIMEOUT_SECS: u64 = 300;

/// Width of the still frame sent to the oracle.
const FRAME_SCALE_WIDTH: u32 = 640;

/// Extract `duration` seconds starting at `start_secs` without re-encoding.
pub async fn extract_segment(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start_secs: f64,
    duration: f64,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    debug!(
        "Extracting segment: {} -> {} (start: {:.2}s, duration: {:.2}s)",
        input.display(),
        output.display(),
        start_secs,
        duration
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(start_secs)
        .duration(duration)
        .codec_copy()
        .output_arg("-avoid_negative_ts")
        .output_arg("make_zero")
        .without_progress();

    runner.run(&cmd).await?;
    ensure_written(output)
}

/// Extract a mono 16 kHz WAV track for loudness analysis.
pub async fn extract_audio(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let output = output.as_ref();
    let cmd = FfmpegCommand::new(input, output)
        .mono_audio(ANALYSIS_SAMPLE_RATE)
        .without_progress();

    runner.run(&cmd).await?;
    ensure_written(output)
}

/// Extract the first frame of `input` as a JPEG.
pub async fn extract_frame(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let output = output.as_ref();
    let cmd = FfmpegCommand::new(input, output)
        .single_frame()
        .video_filter(format!("scale={}:-2", FRAME_SCALE_WIDTH))
        .output_arg("-q:v")
        .output_arg("3")
        .without_progress();

    runner.run(&cmd).await?;
    ensure_written(output)
}

/// Cut `[start, end)` of `input` into `output` by stream copy.
///
/// Progress callbacks receive FFmpeg's `-progress` records; the cut is killed
/// after [`CUT_TIMEOUT_SECS`].
pub async fn cut_clip<F>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: f64,
    end: f64,
    progress_callback: F,
) -> MediaResult<()>
where
    F: Fn(FfmpegProgress) + Send + 'static,
{
    let input = input.as_ref();
    let output = output.as_ref();
    let duration = end - start;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(MediaError::InvalidVideo(format!(
            "Cannot cut empty span {:.2}s..{:.2}s",
            start, end
        )));
    }

    info!(
        "Cutting short: {} -> {} ({:.2}s..{:.2}s)",
        input.display(),
        output.display(),
        start,
        end
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(start)
        .duration(duration)
        .codec_copy()
        .output_arg("-avoid_negative_ts")
        .output_arg("make_zero");

    FfmpegRunner::new()
        .with_timeout(CUT_TIMEOUT_SECS)
        .run_with_progress(&cmd, progress_callback)
        .await?;

    ensure_written(output)
}

fn ensure_written(output: &Path) -> MediaResult<()> {
    if output.exists() {
        Ok(())
    } else {
        Err(MediaError::ffmpeg_failed(
            format!("FFmpeg reported success but {} was not written", output.display()),
            None,
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cut_clip_rejects_empty_span() {
        let dir = TempDir::new().unwrap();
        let result = cut_clip(
            dir.path().join("in.mp4"),
            dir.path().join("short_0.mp4"),
            30.0,
            30.0,
            |_| {},
        )
        .await;
        assert!(matches!(result, Err(MediaError::InvalidVideo(_))));
    }

    #[test]
    fn test_ensure_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short_1.mp4");
        assert!(ensure_written(&path).is_err());
        std::fs::write(&path, b"x").unwrap();
        assert!(ensure_written(&path).is_ok());
    }
}
