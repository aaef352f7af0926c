use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use voiceclone_core::{
    config::Config,
    downloader::{validate_youtube_url, YtDlp},
    AcquisitionPipeline, SourceDescriptor,
};

pub async fn run(
    url: &str,
    name: Option<String>,
    output_dir: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Arc::new(Config::load(config_path)?);

    if !validate_youtube_url(url) {
        warn!("{} does not look like a YouTube URL; trying anyway", url);
    }

    let mut engine = YtDlp::new(config.yt_dlp_path()?);
    if let Ok(ffmpeg) = config.ffmpeg_path() {
        engine = engine.with_ffmpeg(ffmpeg);
    }

    let mut source = SourceDescriptor::new(url);
    if let Some(name) = name {
        source = source.with_name(name);
    }
    if let Some(dir) = output_dir {
        source = source.with_output_dir(dir);
    }

    let (tx, rx) = mpsc::channel(32);
    let progress_handle = super::spawn_progress(rx)?;

    let pipeline = AcquisitionPipeline::new(config, Arc::new(engine)).with_progress(tx);
    let result = pipeline.acquire_voice_sample(&source).await;
    drop(pipeline);

    progress_handle.await?;

    match result {
        Ok(output) => {
            println!("\nVoice sample: {}", output.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
            Err(e.into())
        }
    }
}
