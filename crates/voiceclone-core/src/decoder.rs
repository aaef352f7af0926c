//! Audio decoding and probing using FFmpeg

use crate::error::DecodeError;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Decoder {
    ffmpeg_path: PathBuf,
}

impl Decoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Decode any audio ffmpeg understands to 16-bit PCM WAV
    pub async fn decode_to_wav(&self, input: &Path, output: &Path) -> Result<(), DecodeError> {
        info!("Decoding {} to WAV", input.display());

        let status = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(input)
            // Drop video/cover art streams, keep the first audio stream
            .args(["-vn", "-map", "0:a:0"])
            .args(["-c:a", "pcm_s16le"])
            .arg("-y")
            .arg(output)
            .status()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DecodeError::FfmpegNotFound,
                _ => DecodeError::Io(e),
            })?;

        if !status.success() {
            return Err(DecodeError::FfmpegFailed(status.code()));
        }

        debug!("Decoded to: {}", output.display());
        Ok(())
    }

    /// Get audio file info (sample rate, channels, duration)
    pub async fn probe(&self, input: &Path) -> Result<AudioInfo, DecodeError> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-hide_banner")
            .arg("-i")
            .arg(input)
            .args(["-f", "null", "-"])
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DecodeError::FfmpegNotFound,
                _ => DecodeError::Io(e),
            })?;

        if !output.status.success() {
            return Err(DecodeError::FfmpegFailed(output.status.code()));
        }

        // FFmpeg outputs info to stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(AudioInfo::from_ffmpeg_output(&stderr))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u8,
    pub duration: f64,
}

impl AudioInfo {
    fn from_ffmpeg_output(ffmpeg_output: &str) -> Self {
        Self {
            sample_rate: parse_sample_rate(ffmpeg_output).unwrap_or(48000),
            channels: parse_channels(ffmpeg_output),
            duration: parse_duration(ffmpeg_output).unwrap_or(0.0),
        }
    }
}

fn parse_sample_rate(ffmpeg_output: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+) Hz").ok()?;
    let caps = re.captures(ffmpeg_output)?;
    caps.get(1)?.as_str().parse().ok()
}

fn parse_channels(ffmpeg_output: &str) -> u8 {
    // "..., 44100 Hz, stereo, fltp, ..."
    let layout = Regex::new(r"\d+ Hz, ([^,]+),")
        .ok()
        .and_then(|re| re.captures(ffmpeg_output))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    match layout.as_deref() {
        Some("mono") => 1,
        Some(l) if l.starts_with("5.1") => 6,
        Some(l) if l.starts_with("7.1") => 8,
        Some(l) => l
            .strip_suffix(" channels")
            .and_then(|n| n.parse().ok())
            .unwrap_or(2),
        None => 2,
    }
}

fn parse_duration(ffmpeg_output: &str) -> Option<f64> {
    // "Duration: 00:03:45.12"
    let re = Regex::new(r"Duration: (\d+):(\d+):(\d+)\.(\d+)").ok()?;
    let caps = re.captures(ffmpeg_output)?;

    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    let fraction = caps.get(4)?.as_str();
    let fraction: f64 = format!("0.{}", fraction).parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds + fraction)
}
