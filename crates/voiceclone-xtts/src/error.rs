//! Error types for speech synthesis

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Python not found. Install Python 3.9+")]
    PythonNotFound,

    #[error("Coqui TTS not installed. Run: voiceclone setup")]
    TtsNotInstalled,

    #[error("Speaker sample not found: {}", .0.display())]
    SpeakerNotFound(PathBuf),

    #[error("Language must be a two-letter code (e.g. en, es, fr), got: {0:?}")]
    InvalidLanguage(String),

    #[error("Nothing to say: text is empty")]
    EmptyText,

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Synthesis failed: {0}")]
    Inference(String),

    #[error("Failed to save output: {0}")]
    Save(String),

    #[error("TTS process failed with exit code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
