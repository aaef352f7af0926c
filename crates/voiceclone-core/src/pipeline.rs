//! Voice sample acquisition: fetch or import, then trim

use crate::config::TrimSettings;
use crate::decoder::Decoder;
use crate::error::{Result, TrimError, VoiceCloneError};
use crate::fetcher::{FetchEngine, FetchEvent, Fetcher, SourceDescriptor};
use crate::sanitize::sanitize;
use crate::trimmer::{self, TrimOutcome};
use crate::Config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Pipeline progress stages
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Fetching(FetchEvent),
    Importing { source: PathBuf },
    Trimming { path: PathBuf },
    Complete { output: PathBuf, duration: Duration },
    Failed { stage: String, error: String },
}

pub struct AcquisitionPipeline {
    config: Arc<Config>,
    engine: Arc<dyn FetchEngine>,
    progress_tx: Option<mpsc::Sender<PipelineStage>>,
}

impl AcquisitionPipeline {
    pub fn new(config: Arc<Config>, engine: Arc<dyn FetchEngine>) -> Self {
        Self {
            config,
            engine,
            progress_tx: None,
        }
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<PipelineStage>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Download a reference sample and strip its edge silence.
    ///
    /// Returns the path of the trimmed WAV. A sample that was already on disk
    /// is trimmed again, which leaves an already-trimmed file unchanged.
    pub async fn acquire_voice_sample(&self, source: &SourceDescriptor) -> Result<PathBuf> {
        let start_time = Instant::now();
        info!("Starting acquisition for: {}", source.url());

        let fetcher = Fetcher::new(
            self.engine.clone(),
            self.config.fetch.clone(),
            self.config.voices.directory.clone(),
        );

        // Relay fetch events as pipeline stages
        let (fetcher, relay) = match self.progress_tx.clone() {
            Some(out) => {
                let (tx, mut rx) = mpsc::channel(32);
                let relay = tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        let _ = out.send(PipelineStage::Fetching(event)).await;
                    }
                });
                (fetcher.with_events(tx), Some(relay))
            }
            None => (fetcher, None),
        };

        let fetched = fetcher.fetch(source).await;
        drop(fetcher);
        if let Some(relay) = relay {
            let _ = relay.await;
        }

        let outcome = fetched.map_err(|e| {
            self.report_failure("fetch", &e);
            e
        })?;
        debug!("Fetch outcome: {:?}", outcome);

        let trimmed = self.trim(outcome.into_result().path).await?;
        self.complete(&trimmed, start_time).await;
        Ok(trimmed)
    }

    /// Bring a local recording into the voice directory as a trimmed WAV.
    ///
    /// Any format ffmpeg can read is accepted. An existing sample with the
    /// same sanitized name is returned as is.
    pub async fn import_local_sample(
        &self,
        path: &Path,
        custom_name: Option<&str>,
    ) -> Result<PathBuf> {
        let start_time = Instant::now();

        if !path.exists() {
            return Err(VoiceCloneError::NotFound(path.to_path_buf()));
        }

        let name = match custom_name.filter(|n| !n.trim().is_empty()) {
            Some(n) => n.trim().to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let voice_dir = &self.config.voices.directory;
        let target = voice_dir.join(sanitize(&name));

        if target.exists() {
            info!("Voice sample already exists: {}", target.display());
            self.complete(&target, start_time).await;
            return Ok(target);
        }

        tokio::fs::create_dir_all(voice_dir).await?;
        self.send(PipelineStage::Importing {
            source: path.to_path_buf(),
        })
        .await;

        let decoder = Decoder::new(self.config.ffmpeg_path()?);
        let staging = tempfile::Builder::new()
            .prefix(".import-")
            .suffix(".wav")
            .tempfile_in(voice_dir)?;
        decoder
            .decode_to_wav(path, staging.path())
            .await
            .map_err(|e| {
                self.report_failure("decode", &e);
                e
            })?;

        let placed = self.trim_into_place(staging, &target).await?;
        info!("Imported {} -> {}", path.display(), placed.display());
        self.complete(&placed, start_time).await;
        Ok(placed)
    }

    /// Trim a staged WAV, then move it to `target`.
    ///
    /// The target only ever receives a trimmed sample; on failure the staged
    /// file is dropped and `target` is left absent.
    async fn trim_into_place(&self, staging: NamedTempFile, target: &Path) -> Result<PathBuf> {
        self.trim(staging.path().to_path_buf()).await?;
        staging
            .persist(target)
            .map_err(|e| VoiceCloneError::Io(e.error))?;
        Ok(target.to_path_buf())
    }

    async fn trim(&self, path: PathBuf) -> Result<PathBuf> {
        self.send(PipelineStage::Trimming { path: path.clone() }).await;

        let settings: TrimSettings = self.config.trim;
        let outcome = tokio::task::spawn_blocking(move || trimmer::trim(&path, &settings))
            .await
            .map_err(|e| VoiceCloneError::Pipeline(format!("trim task failed: {e}")))?
            .map_err(|e: TrimError| {
                self.report_failure("trim", &e);
                e
            })?;

        if let TrimOutcome::Trimmed {
            start_ms, end_ms, ..
        } = &outcome
        {
            debug!("Kept {}..{} ms", start_ms, end_ms);
        }
        Ok(outcome.into_path())
    }

    async fn complete(&self, output: &Path, start_time: Instant) {
        let duration = start_time.elapsed();
        info!(
            "Voice sample ready: {} ({:.1}s)",
            output.display(),
            duration.as_secs_f32()
        );
        self.send(PipelineStage::Complete {
            output: output.to_path_buf(),
            duration,
        })
        .await;
    }

    fn report_failure(&self, stage: &str, error: &dyn std::error::Error) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.try_send(PipelineStage::Failed {
                stage: stage.to_string(),
                error: error.to_string(),
            });
        }
    }

    async fn send(&self, stage: PipelineStage) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(stage).await;
        }
    }
}
