//! WAV to lossy conversion for finished samples and synthesized speech

use crate::config::ConvertSettings;
use crate::encoder::{Encoder, OutputFormat};
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Converter {
    encoder: Encoder,
}

impl Converter {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self {
            encoder: Encoder::new(ffmpeg_path),
        }
    }

    /// Encode `path` (a `.wav`) into a sibling file with the target extension.
    ///
    /// The source file is left untouched. Returns the path of the new file.
    pub async fn convert(
        &self,
        path: &Path,
        settings: &ConvertSettings,
    ) -> Result<PathBuf, ConvertError> {
        let format = OutputFormat::from_name(&settings.format)
            .ok_or_else(|| ConvertError::UnsupportedTarget(settings.format.clone()))?;
        let output = conversion_target(path, format, &settings.bitrate)?;

        info!("Converting {} -> {}", path.display(), output.display());
        self.encoder
            .encode(path, &output, format, &settings.bitrate)
            .await?;

        Ok(output)
    }
}

/// Validate a conversion request and return the sibling output path.
pub fn conversion_target(
    path: &Path,
    format: OutputFormat,
    bitrate: &str,
) -> Result<PathBuf, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext != "wav" {
        return Err(ConvertError::Format {
            path: path.to_path_buf(),
            found: ext,
        });
    }

    if !is_valid_bitrate(bitrate) {
        return Err(ConvertError::InvalidBitrate(bitrate.to_string()));
    }

    Ok(path.with_extension(format.extension()))
}

/// "192k", "320K" or a plain bits-per-second count
fn is_valid_bitrate(bitrate: &str) -> bool {
    let digits = bitrate
        .strip_suffix(|c: char| c == 'k' || c == 'K')
        .unwrap_or(bitrate);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) && digits != "0"
}
