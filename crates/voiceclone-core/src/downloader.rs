//! Remote audio retrieval using yt-dlp

use crate::error::DownloadError;
use crate::fetcher::{AttemptConfig, FetchEngine, FetchEvent, RemoteMedia};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct YtDlp {
    yt_dlp_path: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub ext: String,
    /// Where yt-dlp would write the media, as rendered from the output template
    #[serde(default, alias = "_filename")]
    pub filename: Option<String>,
}

impl YtDlp {
    pub fn new(yt_dlp_path: PathBuf) -> Self {
        Self {
            yt_dlp_path,
            ffmpeg_location: None,
        }
    }

    /// Point yt-dlp at a specific ffmpeg for the WAV extraction step
    pub fn with_ffmpeg(mut self, ffmpeg: PathBuf) -> Self {
        self.ffmpeg_location = Some(ffmpeg);
        self
    }

    /// Flags shared by metadata lookup and download
    fn command(&self, config: &AttemptConfig) -> Command {
        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args(["--no-playlist", "--no-warnings"]);
        cmd.arg("--user-agent").arg(&config.user_agent);
        cmd.arg("--source-address").arg(&config.source_address);
        cmd.arg("-f").arg(&config.format);
        cmd.arg("-o")
            .arg(config.output_dir.join(&config.output_template));
        if let Some(ffmpeg) = &self.ffmpeg_location {
            cmd.arg("--ffmpeg-location").arg(ffmpeg);
        }
        cmd
    }
}

#[async_trait]
impl FetchEngine for YtDlp {
    async fn resolve(&self, url: &str, config: &AttemptConfig) -> Result<RemoteMedia, DownloadError> {
        debug!("Resolving metadata for: {}", url);

        let output = self
            .command(config)
            .arg("-J")
            .arg(url)
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(url, output.status.code(), &stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata: VideoMetadata = serde_json::from_str(&stdout)
            .map_err(|e| DownloadError::MetadataParse(e.to_string()))?;

        let expected_path = match &metadata.filename {
            Some(name) => PathBuf::from(name),
            None => config
                .output_dir
                .join(format!("{}.{}", metadata.title, metadata.ext)),
        };
        debug!("yt-dlp will write: {}", expected_path.display());

        Ok(RemoteMedia {
            id: metadata.id,
            title: metadata.title,
            expected_path,
        })
    }

    async fn download(
        &self,
        url: &str,
        config: &AttemptConfig,
        progress: Option<&mpsc::Sender<FetchEvent>>,
    ) -> Result<(), DownloadError> {
        info!("Downloading audio (attempt {})", config.attempt);

        let sleep = format!("{:.2}", config.retry_sleep_secs);
        let mut child = self
            .command(config)
            .args(["-x", "--audio-format"])
            .arg(&config.audio_format)
            .arg("--retries")
            .arg(config.transfer_retries.to_string())
            .arg("--fragment-retries")
            .arg(config.fragment_retries.to_string())
            .arg("--retry-sleep")
            .arg(format!("http:{sleep}"))
            .arg("--retry-sleep")
            .arg(format!("fragment:{sleep}"))
            .arg("--newline")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Drain stderr concurrently so a chatty failure cannot block the pipe
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(percent) = parse_progress(&line) {
                    if let Some(tx) = progress {
                        let _ = tx.send(FetchEvent::Downloading { percent }).await;
                    }
                } else {
                    debug!("yt-dlp: {}", line);
                }
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(classify_failure(url, status.code(), &stderr));
        }
        Ok(())
    }
}

fn spawn_error(e: std::io::Error) -> DownloadError {
    match e.kind() {
        std::io::ErrorKind::NotFound => DownloadError::YtDlpNotFound,
        _ => DownloadError::Io(e),
    }
}

/// Map a failed yt-dlp run onto a typed error using its stderr
fn classify_failure(url: &str, code: Option<i32>, stderr: &str) -> DownloadError {
    debug!("yt-dlp stderr: {}", stderr);

    if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        return DownloadError::VideoUnavailable(url.to_string());
    }
    if stderr.contains("is not a valid URL") || stderr.contains("Unsupported URL") {
        return DownloadError::InvalidUrl(url.to_string());
    }

    let last_error = stderr
        .lines()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
        .unwrap_or("")
        .trim()
        .to_string();

    DownloadError::YtDlpFailed {
        code,
        stderr: last_error,
    }
}

static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").expect("valid regex")
});

/// Percentage from a `[download]  42.3% of ...` line
fn parse_progress(line: &str) -> Option<f32> {
    PROGRESS_RE.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Validate that a string looks like a YouTube URL
pub fn validate_youtube_url(url: &str) -> bool {
    url.contains("youtube.com/watch")
        || url.contains("youtu.be/")
        || url.contains("youtube.com/shorts")
        || url.contains("music.youtube.com")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchSettings;
    use crate::fetcher::initial_attempt_config;
    use rand::{rngs::StdRng, SeedableRng};
    use std::path::Path;

    #[test]
    fn test_validate_youtube_url() {
        assert!(validate_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(validate_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(validate_youtube_url("https://youtube.com/shorts/abc"));
        assert!(validate_youtube_url("https://music.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!validate_youtube_url("https://example.com/video"));
    }

    #[test]
    fn test_parse_progress() {
        assert_eq!(parse_progress("[download]  42.3% of 3.21MiB at 1.2MiB/s"), Some(42.3));
        assert_eq!(parse_progress("[download] 100% of 3.21MiB in 00:02"), Some(100.0));
        assert_eq!(parse_progress("[download] Destination: data/x.webm"), None);
        assert_eq!(parse_progress("[ExtractAudio] Destination: data/x.wav"), None);
    }

    #[test]
    fn test_metadata_filename_alias() {
        let json = r#"{"id":"abc","title":"Test Clip #1","ext":"webm","_filename":"data/Test Clip #1.webm"}"#;
        let meta: VideoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.filename.as_deref(), Some("data/Test Clip #1.webm"));

        let json = r#"{"id":"abc","title":"t","ext":"m4a"}"#;
        let meta: VideoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.filename, None);
    }

    #[test]
    fn test_classify_failure() {
        let url = "https://youtu.be/x";
        assert!(matches!(
            classify_failure(url, Some(1), "ERROR: [youtube] x: Video unavailable"),
            DownloadError::VideoUnavailable(_)
        ));
        assert!(matches!(
            classify_failure(url, Some(1), "ERROR: 'nope' is not a valid URL"),
            DownloadError::InvalidUrl(_)
        ));
        match classify_failure(url, Some(1), "WARNING: retrying\nERROR: HTTP Error 403: Forbidden\n") {
            DownloadError::YtDlpFailed { code, stderr } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "ERROR: HTTP Error 403: Forbidden");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let mut rng = StdRng::seed_from_u64(0);
        let config = initial_attempt_config(&FetchSettings::default(), Path::new("data"), &mut rng);
        let engine = YtDlp::new(PathBuf::from("/nonexistent/yt-dlp"));

        let err = engine.resolve("https://youtu.be/x", &config).await.unwrap_err();
        assert!(matches!(err, DownloadError::YtDlpNotFound));
        let err = engine
            .download("https://youtu.be/x", &config, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::YtDlpNotFound));
    }
}
