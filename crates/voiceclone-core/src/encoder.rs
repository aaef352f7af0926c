//! Lossy audio encoding using FFmpeg

use crate::error::EncodeError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Lossy targets a WAV voice sample can be converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Mp3,
    Aac,
    Opus,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "m4a",
            OutputFormat::Opus => "opus",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mp3" => Some(OutputFormat::Mp3),
            "aac" | "m4a" => Some(OutputFormat::Aac),
            "opus" => Some(OutputFormat::Opus),
            _ => None,
        }
    }

    fn codec(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "libmp3lame",
            OutputFormat::Aac => "aac",
            OutputFormat::Opus => "libopus",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Mp3 => write!(f, "MP3"),
            OutputFormat::Aac => write!(f, "AAC"),
            OutputFormat::Opus => write!(f, "Opus"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Encoder {
    ffmpeg_path: PathBuf,
}

impl Encoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Encode audio to target format at a constant bitrate
    pub async fn encode(
        &self,
        input: &Path,
        output: &Path,
        format: OutputFormat,
        bitrate: &str,
    ) -> Result<(), EncodeError> {
        info!("Encoding to {} at {}", format, bitrate);

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd.arg("-i").arg(input);
        cmd.args(["-vn", "-c:a", format.codec(), "-b:a", bitrate]);
        cmd.arg("-y").arg(output);

        let status = cmd.status().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EncodeError::FfmpegNotFound,
            _ => EncodeError::Io(e),
        })?;

        if !status.success() {
            return Err(EncodeError::FfmpegFailed(status.code()));
        }

        debug!("Encoded to: {}", output.display());
        Ok(())
    }
}
