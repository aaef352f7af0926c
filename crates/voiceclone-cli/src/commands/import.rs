use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

use voiceclone_core::{config::Config, downloader::YtDlp, AcquisitionPipeline};

pub async fn run(file: &Path, name: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let config = Arc::new(Config::load(config_path)?);

    // Imports never reach the engine; yt-dlp need not be installed
    let engine = YtDlp::new(config.paths.yt_dlp.clone().unwrap_or_else(|| "yt-dlp".into()));

    let (tx, rx) = mpsc::channel(32);
    let progress_handle = super::spawn_progress(rx)?;

    let pipeline = AcquisitionPipeline::new(config, Arc::new(engine)).with_progress(tx);
    let result = pipeline.import_local_sample(file, name).await;
    drop(pipeline);

    progress_handle.await?;

    let output = result?;
    println!("\nVoice sample: {}", output.display());
    Ok(())
}
