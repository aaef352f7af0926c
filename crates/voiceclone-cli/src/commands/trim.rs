use anyhow::Result;
use std::path::Path;

use voiceclone_core::{config::Config, trimmer, TrimOutcome};

pub async fn run(
    path: &Path,
    min_silence: Option<u32>,
    silence_thresh: Option<i32>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_path)?;

    let mut settings = config.trim;
    if let Some(ms) = min_silence {
        settings.min_silence_ms = ms;
    }
    if let Some(db) = silence_thresh {
        settings.silence_thresh_db = db;
    }

    let path = path.to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || trimmer::trim(&path, &settings)).await??;

    match outcome {
        TrimOutcome::Trimmed {
            path,
            start_ms,
            end_ms,
            original_ms,
        } => println!(
            "Trimmed {}: kept {}..{} ms of {} ms",
            path.display(),
            start_ms,
            end_ms,
            original_ms
        ),
        TrimOutcome::Unchanged { path } => println!("Nothing to trim in {}", path.display()),
    }
    Ok(())
}
