//! Error types for voiceclone-core

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VoiceCloneError>;

#[derive(Error, Debug)]
pub enum VoiceCloneError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Trim failed: {0}")]
    Trim(#[from] TrimError),

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// Raised by the fetcher once every attempt has failed.
#[derive(Error, Debug)]
#[error("Failed to download after {attempts} attempts: {source}")]
pub struct FetchError {
    pub attempts: u32,
    #[source]
    pub source: DownloadError,
}

/// A single resolve-or-download failure reported by a fetch engine.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("yt-dlp not found. Install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("yt-dlp failed with exit code {code:?}: {stderr}")]
    YtDlpFailed { code: Option<i32>, stderr: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Video unavailable or private: {0}")]
    VideoUnavailable(String),

    #[error("Failed to parse metadata: {0}")]
    MetadataParse(String),

    #[error("Expected download output is missing: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TrimError {
    #[error("Audio file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Input file must be a WAV file, got: {found:?} ({})", .path.display())]
    Format { path: PathBuf, found: String },

    #[error("Unsupported target format: {0} (expected mp3, aac or opus)")]
    UnsupportedTarget(String),

    #[error("Invalid bitrate: {0} (expected e.g. 192k)")]
    InvalidBitrate(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("FFmpeg not found. Install with: brew install ffmpeg")]
    FfmpegNotFound,

    #[error("FFmpeg failed with exit code: {0:?}")]
    FfmpegFailed(Option<i32>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("FFmpeg not found")]
    FfmpegNotFound,

    #[error("FFmpeg encoding failed with exit code: {0:?}")]
    FfmpegFailed(Option<i32>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
