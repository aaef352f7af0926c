pub mod config;
pub mod convert;
pub mod doctor;
pub mod fetch;
pub mod import;
pub mod setup;
pub mod speak;
pub mod trim;
pub mod voices;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use voiceclone_core::fetcher::FetchEvent;
use voiceclone_core::PipelineStage;

/// Drive a progress bar from pipeline stages until the sender is dropped
pub fn spawn_progress(mut rx: mpsc::Receiver<PipelineStage>) -> anyhow::Result<JoinHandle<()>> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("=>-"),
    );

    Ok(tokio::spawn(async move {
        while let Some(stage) = rx.recv().await {
            match stage {
                PipelineStage::Fetching(event) => match event {
                    FetchEvent::Resolving { attempt } => {
                        pb.set_position(0);
                        pb.set_message(format!("Resolving (attempt {})...", attempt));
                    }
                    FetchEvent::Resolved { title, .. } => {
                        pb.set_message(format!("Found: {}", truncate(&title, 40)));
                    }
                    FetchEvent::AlreadyPresent { path } => {
                        pb.set_position(80);
                        pb.set_message(format!("Already downloaded: {}", path.display()));
                    }
                    FetchEvent::Downloading { percent } => {
                        pb.set_position((percent * 0.8) as u64);
                        pb.set_message("Downloading...");
                    }
                    FetchEvent::Downloaded { .. } => {
                        pb.set_position(80);
                        pb.set_message("Downloaded");
                    }
                    FetchEvent::Retrying {
                        attempt,
                        delay,
                        error,
                    } => {
                        pb.set_position(0);
                        pb.set_message(format!(
                            "Retrying in {}s (attempt {}): {}",
                            delay.as_secs(),
                            attempt,
                            truncate(&error, 40)
                        ));
                    }
                },
                PipelineStage::Importing { source } => {
                    pb.set_position(40);
                    pb.set_message(format!("Decoding {}...", source.display()));
                }
                PipelineStage::Trimming { .. } => {
                    pb.set_position(90);
                    pb.set_message("Trimming silence...");
                }
                PipelineStage::Complete { output, duration } => {
                    pb.set_position(100);
                    pb.finish_with_message(format!(
                        "Done: {} ({:.1}s)",
                        output.display(),
                        duration.as_secs_f32()
                    ));
                }
                PipelineStage::Failed { stage, error } => {
                    pb.abandon_with_message(format!("Failed at {}: {}", stage, error));
                }
            }
        }
    }))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
