//! Voice cloning speech synthesis bridge for voiceclone
//!
//! Drives Coqui XTTS v2 in a Python subprocess: given a reference sample of
//! a speaker, it speaks arbitrary text in that voice.

mod error;
mod xtts;

pub use error::SynthesisError;
pub use xtts::Xtts;

use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_MODEL: &str = "tts_models/multilingual/multi-dataset/xtts_v2";

/// Where inference runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Device {
    /// CUDA when available, otherwise CPU
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl Device {
    fn as_arg(&self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_arg())
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    /// Reference sample of the voice to clone
    pub speaker_wav: PathBuf,
    /// Two-letter language code
    pub language: String,
    pub output: PathBuf,
    pub model: String,
    pub device: Device,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, speaker_wav: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            speaker_wav: speaker_wav.into(),
            language: "en".to_string(),
            output: output.into(),
            model: DEFAULT_MODEL.to_string(),
            device: Device::Auto,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Reject requests the model would fail on
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        if !is_language_code(&self.language) {
            return Err(SynthesisError::InvalidLanguage(self.language.clone()));
        }
        if !self.speaker_wav.is_file() {
            return Err(SynthesisError::SpeakerNotFound(self.speaker_wav.clone()));
        }
        Ok(())
    }
}

fn is_language_code(language: &str) -> bool {
    language.len() == 2 && language.chars().all(|c| c.is_ascii_alphabetic())
}

/// Text-to-speech with a cloned voice
#[derive(Debug)]
pub struct Synthesizer {
    python_path: PathBuf,
}

impl Synthesizer {
    pub fn new(python_path: PathBuf) -> Self {
        Self { python_path }
    }

    /// Whether Coqui TTS is importable from the configured Python
    pub async fn is_available(&self) -> bool {
        Xtts::new(self.python_path.clone()).is_installed().await
    }

    /// Speak `request.text` in the voice of `request.speaker_wav`.
    ///
    /// Returns the path of the written WAV.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<PathBuf, SynthesisError> {
        request.validate()?;
        ensure_parent(&request.output).await?;

        info!(
            "Synthesizing {} chars in {} with voice {}",
            request.text.chars().count(),
            request.language,
            request.speaker_wav.display()
        );

        Xtts::new(self.python_path.clone())
            .run(
                &request.text,
                &request.speaker_wav,
                &request.language.to_lowercase(),
                &request.output,
                &request.model,
                request.device,
            )
            .await?;

        Ok(request.output.clone())
    }
}

async fn ensure_parent(path: &Path) -> Result<(), SynthesisError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}
