//! Environment check for the `vshorts` tool: output and work directories,
//! FFmpeg binaries and oracle configuration.

use std::path::Path;

use vshorts_ai::AiConfig;
use vshorts_media::{check_ffmpeg, check_ffprobe};
use vshorts_pipeline::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env()?;

    println!(
        "vshorts-selfcheck: starting with output_dir={}",
        config.output_dir.display()
    );
    ensure_dir(&config.output_dir).await?;
    if let Some(work_dir) = &config.work_dir {
        ensure_dir(work_dir).await?;
    }

    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!("vshorts-selfcheck: ffmpeg={} ffprobe={}", ffmpeg.display(), ffprobe.display());

    let ai = AiConfig::from_env()?;
    println!(
        "vshorts-selfcheck: oracle={} models={}/{}",
        ai.base_url, ai.pre_score_model, ai.detailed_model
    );

    println!("vshorts-selfcheck: ok");
    Ok(())
}

async fn ensure_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path.as_ref()).await?;
    Ok(())
}
