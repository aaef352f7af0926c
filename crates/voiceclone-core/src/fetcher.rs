//! Remote voice sample fetching with whole-cycle retries
//!
//! Each attempt resolves the URL, works out where the sample will land, and
//! downloads + transcodes it to WAV through a [`FetchEngine`]. A failed
//! attempt is thrown away entirely; the next one starts over with a fresh
//! client identity after an `attempt²` second pause.

use crate::config::FetchSettings;
use crate::error::{DownloadError, FetchError};
use crate::sanitize::{sanitize, sanitize_stem, SAMPLE_EXTENSION};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One acquisition request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    url: String,
    custom_name: Option<String>,
    output_dir: Option<PathBuf>,
}

impl SourceDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            custom_name: None,
            output_dir: None,
        }
    }

    /// Name the sample instead of using the remote title. Blank names are ignored.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.custom_name = (!name.trim().is_empty()).then(|| name.trim().to_string());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }
}

/// Where a fetched sample lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub path: PathBuf,
    /// Sanitized stem, without extension
    pub stem: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Transferred and transcoded during this call
    Downloaded(FetchResult),
    /// The sanitized target already existed; nothing was transferred
    AlreadyPresent(FetchResult),
}

impl FetchOutcome {
    pub fn result(&self) -> &FetchResult {
        match self {
            FetchOutcome::Downloaded(r) | FetchOutcome::AlreadyPresent(r) => r,
        }
    }

    pub fn path(&self) -> &Path {
        &self.result().path
    }

    pub fn into_result(self) -> FetchResult {
        match self {
            FetchOutcome::Downloaded(r) | FetchOutcome::AlreadyPresent(r) => r,
        }
    }
}

/// Metadata the engine reports for a URL before downloading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMedia {
    pub id: String,
    pub title: String,
    /// File the engine would write for this media, before audio extraction
    pub expected_path: PathBuf,
}

/// Progress notifications, the channel form of yt-dlp progress hooks
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Resolving { attempt: u32 },
    Resolved { title: String, target: PathBuf },
    AlreadyPresent { path: PathBuf },
    Downloading { percent: f32 },
    Downloaded { path: PathBuf },
    Retrying { attempt: u32, delay: Duration, error: String },
}

/// Everything the engine needs for one resolve-and-download attempt
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptConfig {
    /// 1-based attempt number
    pub attempt: u32,
    /// Client signature sent with every request
    pub user_agent: String,
    /// Stream selector
    pub format: String,
    /// Lossless container the download is transcoded to
    pub audio_format: String,
    pub output_dir: PathBuf,
    /// Engine filename pattern inside `output_dir`
    pub output_template: String,
    pub transfer_retries: u32,
    pub fragment_retries: u32,
    /// Engine-level pause between its own retries, seconds
    pub retry_sleep_secs: f64,
    pub source_address: String,
    agent_pool: Arc<[String]>,
    sleep_range: (f64, f64),
}

/// Configuration for the first attempt against `output_dir`.
pub fn initial_attempt_config<R: Rng + ?Sized>(
    settings: &FetchSettings,
    output_dir: &Path,
    rng: &mut R,
) -> AttemptConfig {
    let agent_pool: Arc<[String]> = settings.user_agents.clone().into();
    let sleep_range = (settings.retry_sleep_min_secs, settings.retry_sleep_max_secs);

    AttemptConfig {
        attempt: 1,
        user_agent: agent_pool.choose(rng).cloned().unwrap_or_default(),
        format: "bestaudio/best".to_string(),
        audio_format: SAMPLE_EXTENSION.to_string(),
        output_dir: output_dir.to_path_buf(),
        output_template: "%(title)s.%(ext)s".to_string(),
        transfer_retries: settings.transfer_retries,
        fragment_retries: settings.fragment_retries,
        retry_sleep_secs: sample_sleep(sleep_range, rng),
        source_address: settings.source_address.clone(),
        agent_pool,
        sleep_range,
    }
}

/// Configuration for attempt `attempt`, derived from the previous one.
///
/// Picks a different user agent whenever the pool allows it and draws a
/// fresh engine retry pause. `previous` is not modified.
pub fn next_attempt_config<R: Rng + ?Sized>(
    previous: &AttemptConfig,
    attempt: u32,
    rng: &mut R,
) -> AttemptConfig {
    let others: Vec<&String> = previous
        .agent_pool
        .iter()
        .filter(|ua| **ua != previous.user_agent)
        .collect();
    let user_agent = others
        .choose(rng)
        .map(|ua| (*ua).clone())
        .unwrap_or_else(|| previous.user_agent.clone());

    AttemptConfig {
        attempt,
        user_agent,
        retry_sleep_secs: sample_sleep(previous.sleep_range, rng),
        ..previous.clone()
    }
}

fn sample_sleep<R: Rng + ?Sized>((min, max): (f64, f64), rng: &mut R) -> f64 {
    if min < max {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Attempt bookkeeping for one `fetch` call
#[derive(Debug, Clone)]
pub struct RetryState {
    pub attempt: u32,
    pub max_attempts: u32,
    pub current: AttemptConfig,
}

/// What to do after a failed attempt
#[derive(Debug)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp(FetchError),
}

impl RetryState {
    pub fn new(max_attempts: u32, first: AttemptConfig) -> Self {
        Self {
            attempt: first.attempt,
            max_attempts,
            current: first,
        }
    }

    /// Current client signature
    pub fn identity(&self) -> &str {
        &self.current.user_agent
    }

    /// Pause after the `failed_attempt`-th failure
    pub fn backoff(failed_attempt: u32) -> Duration {
        Duration::from_secs(u64::from(failed_attempt).pow(2))
    }

    /// Record a failure of the current attempt and rotate to the next one.
    pub fn record_failure<R: Rng + ?Sized>(
        &mut self,
        error: DownloadError,
        rng: &mut R,
    ) -> RetryDecision {
        let failed = self.attempt;
        if failed >= self.max_attempts {
            return RetryDecision::GiveUp(FetchError {
                attempts: failed,
                source: error,
            });
        }
        self.attempt = failed + 1;
        self.current = next_attempt_config(&self.current, self.attempt, rng);
        RetryDecision::Retry {
            delay: Self::backoff(failed),
        }
    }
}

/// Resolves and downloads remote media; implemented by [`crate::downloader::YtDlp`]
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Look up metadata without transferring media
    async fn resolve(&self, url: &str, config: &AttemptConfig) -> Result<RemoteMedia, DownloadError>;

    /// Download the best audio stream and transcode it to `config.audio_format`
    async fn download(
        &self,
        url: &str,
        config: &AttemptConfig,
        progress: Option<&mpsc::Sender<FetchEvent>>,
    ) -> Result<(), DownloadError>;
}

pub struct Fetcher {
    engine: Arc<dyn FetchEngine>,
    settings: FetchSettings,
    default_dir: PathBuf,
    events: Option<mpsc::Sender<FetchEvent>>,
}

impl Fetcher {
    pub fn new(engine: Arc<dyn FetchEngine>, settings: FetchSettings, default_dir: PathBuf) -> Self {
        Self {
            engine,
            settings,
            default_dir,
            events: None,
        }
    }

    /// Report progress on `tx`
    pub fn with_events(mut self, tx: mpsc::Sender<FetchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Fetch the sample described by `source`, retrying whole attempts.
    pub async fn fetch(&self, source: &SourceDescriptor) -> Result<FetchOutcome, FetchError> {
        let output_dir = source
            .output_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_dir.clone());

        let mut rng = StdRng::from_entropy();
        let first = initial_attempt_config(&self.settings, &output_dir, &mut rng);
        let mut state = RetryState::new(self.settings.max_attempts, first);

        info!("Fetching voice sample from: {}", source.url());

        loop {
            let error = match self.attempt(source, &state.current).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => e,
            };

            warn!("Attempt {} failed: {}", state.attempt, error);

            let message = error.to_string();
            match state.record_failure(error, &mut rng) {
                RetryDecision::Retry { delay } => {
                    info!("Retrying in {} seconds...", delay.as_secs());
                    debug!("Next identity: {}", state.identity());
                    self.emit(FetchEvent::Retrying {
                        attempt: state.attempt,
                        delay,
                        error: message,
                    })
                    .await;
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp(err) => return Err(err),
            }
        }
    }

    /// One resolve-and-download cycle.
    ///
    /// The engine works inside a fresh staging directory under the output
    /// directory, so its temporary file can never be the target. The target
    /// only appears through the final rename; dropping the staging directory
    /// discards anything a failed attempt left behind.
    async fn attempt(
        &self,
        source: &SourceDescriptor,
        config: &AttemptConfig,
    ) -> Result<FetchOutcome, DownloadError> {
        tokio::fs::create_dir_all(&config.output_dir).await?;
        let staging = tempfile::Builder::new()
            .prefix(".fetch-")
            .tempdir_in(&config.output_dir)?;
        let staged = AttemptConfig {
            output_dir: staging.path().to_path_buf(),
            ..config.clone()
        };

        self.emit(FetchEvent::Resolving {
            attempt: config.attempt,
        })
        .await;
        let media = self.engine.resolve(source.url(), &staged).await?;

        let temp_path = staging.path().join(
            media
                .expected_path
                .with_extension(SAMPLE_EXTENSION)
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| format!("{}.{}", media.id, SAMPLE_EXTENSION).into()),
        );
        let name_source = match source.custom_name() {
            Some(name) => name.to_string(),
            None => temp_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| media.title.clone()),
        };
        let stem = sanitize_stem(&name_source);
        if stem.is_empty() {
            warn!(
                "{:?} has no usable characters; sample will be stored as a bare .{}",
                name_source, SAMPLE_EXTENSION
            );
        }
        let target = config.output_dir.join(sanitize(&name_source));
        let result = FetchResult {
            path: target.clone(),
            stem,
        };

        info!("Final filename will be: {}", target.display());
        self.emit(FetchEvent::Resolved {
            title: media.title.clone(),
            target: target.clone(),
        })
        .await;

        if target.exists() {
            info!("File already exists, skipping download");
            return Ok(self.already_present(result).await);
        }

        self.engine
            .download(source.url(), &staged, self.events.as_ref())
            .await?;

        if !temp_path.exists() {
            return Err(DownloadError::MissingOutput(temp_path));
        }
        // Another run may have finished the same sample meanwhile
        if target.exists() {
            info!("File appeared during download, keeping the existing one");
            return Ok(self.already_present(result).await);
        }
        tokio::fs::rename(&temp_path, &target).await?;
        if let Err(e) = staging.close() {
            warn!("Could not remove staging directory: {}", e);
        }

        info!("Downloaded: {} ({})", media.title, media.id);
        self.emit(FetchEvent::Downloaded {
            path: target.clone(),
        })
        .await;
        Ok(FetchOutcome::Downloaded(result))
    }

    async fn already_present(&self, result: FetchResult) -> FetchOutcome {
        self.emit(FetchEvent::AlreadyPresent {
            path: result.path.clone(),
        })
        .await;
        FetchOutcome::AlreadyPresent(result)
    }

    async fn emit(&self, event: FetchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Engine that writes a small WAV for `title`, optionally failing first.
    struct FakeEngine {
        title: String,
        fail_resolves: u32,
        fail_downloads: u32,
        resolves: AtomicU32,
        downloads: AtomicU32,
        agents: Mutex<Vec<String>>,
        output_dirs: Mutex<Vec<PathBuf>>,
    }

    impl FakeEngine {
        fn new(title: &str) -> Self {
            Self {
                title: title.to_string(),
                fail_resolves: 0,
                fail_downloads: 0,
                resolves: AtomicU32::new(0),
                downloads: AtomicU32::new(0),
                agents: Mutex::new(Vec::new()),
                output_dirs: Mutex::new(Vec::new()),
            }
        }

        fn temp_path(&self, config: &AttemptConfig) -> PathBuf {
            config.output_dir.join(format!("{}.wav", self.title))
        }
    }

    #[async_trait]
    impl FetchEngine for FakeEngine {
        async fn resolve(&self, _url: &str, config: &AttemptConfig) -> Result<RemoteMedia, DownloadError> {
            let n = self.resolves.fetch_add(1, Ordering::SeqCst);
            self.agents.lock().unwrap().push(config.user_agent.clone());
            self.output_dirs.lock().unwrap().push(config.output_dir.clone());
            if n < self.fail_resolves {
                return Err(DownloadError::YtDlpFailed {
                    code: Some(1),
                    stderr: "HTTP Error 429: Too Many Requests".to_string(),
                });
            }
            Ok(RemoteMedia {
                id: "abc123".to_string(),
                title: self.title.clone(),
                expected_path: config.output_dir.join(format!("{}.webm", self.title)),
            })
        }

        async fn download(
            &self,
            _url: &str,
            config: &AttemptConfig,
            progress: Option<&mpsc::Sender<FetchEvent>>,
        ) -> Result<(), DownloadError> {
            let n = self.downloads.fetch_add(1, Ordering::SeqCst);
            self.output_dirs.lock().unwrap().push(config.output_dir.clone());
            let temp = self.temp_path(config);
            if n < self.fail_downloads {
                // Leave a partial file behind, as an interrupted transcode would
                std::fs::write(&temp, b"partial").unwrap();
                return Err(DownloadError::YtDlpFailed {
                    code: Some(1),
                    stderr: "fragment 3 not found".to_string(),
                });
            }
            if let Some(tx) = progress {
                let _ = tx.send(FetchEvent::Downloading { percent: 100.0 }).await;
            }
            std::fs::write(&temp, b"RIFF....WAVE").unwrap();
            Ok(())
        }
    }

    fn fetcher(engine: Arc<FakeEngine>, dir: &Path) -> Fetcher {
        Fetcher::new(engine, FetchSettings::default(), dir.to_path_buf())
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_fetch_renames_to_sanitized_title() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new("Test Clip #1"));

        let outcome = fetcher(engine.clone(), dir.path())
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap();

        let expected = dir.path().join("test_clip_1.wav");
        assert_eq!(
            outcome,
            FetchOutcome::Downloaded(FetchResult {
                path: expected.clone(),
                stem: "test_clip_1".to_string(),
            })
        );
        assert_eq!(entries(dir.path()), vec!["test_clip_1.wav"]);
    }

    #[tokio::test]
    async fn test_fetch_uses_custom_name() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new("Some Long Video Title"));
        let source = SourceDescriptor::new("https://youtu.be/abc123").with_name("Morgan Freeman");

        let outcome = fetcher(engine, dir.path()).fetch(&source).await.unwrap();
        assert_eq!(outcome.path(), dir.path().join("morgan_freeman.wav"));
        assert_eq!(entries(dir.path()), vec!["morgan_freeman.wav"]);
    }

    #[tokio::test]
    async fn test_fetch_is_idempotent() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new("Test Clip #1"));
        let fetcher = fetcher(engine.clone(), dir.path());
        let source = SourceDescriptor::new("https://youtu.be/abc123");

        let first = fetcher.fetch(&source).await.unwrap();
        let second = fetcher.fetch(&source).await.unwrap();

        assert!(matches!(first, FetchOutcome::Downloaded(_)));
        assert!(matches!(second, FetchOutcome::AlreadyPresent(_)));
        assert_eq!(first.path(), second.path());
        assert_eq!(engine.downloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_download_leaves_other_files_alone() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Test Clip #1.wav"), b"unrelated").unwrap();
        let engine = Arc::new(FakeEngine::new("Test Clip #1"));

        let outcome = fetcher(engine, dir.path())
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap();

        assert_eq!(std::fs::read(outcome.path()).unwrap(), b"RIFF....WAVE");
        assert_eq!(
            std::fs::read(dir.path().join("Test Clip #1.wav")).unwrap(),
            b"unrelated"
        );
        assert_eq!(entries(dir.path()), vec!["Test Clip #1.wav", "test_clip_1.wav"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_download_of_canonical_title_is_not_kept() {
        let dir = tempdir().unwrap();
        let mut engine = FakeEngine::new("clip");
        engine.fail_downloads = 1;
        let engine = Arc::new(engine);

        let outcome = fetcher(engine.clone(), dir.path())
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::Downloaded(_)));
        assert_eq!(engine.downloads.load(Ordering::SeqCst), 2);
        assert_eq!(std::fs::read(outcome.path()).unwrap(), b"RIFF....WAVE");
        assert_eq!(entries(dir.path()), vec!["clip.wav"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_canonical_title_failing_every_attempt_leaves_nothing() {
        let dir = tempdir().unwrap();
        let mut engine = FakeEngine::new("clip");
        engine.fail_downloads = u32::MAX;
        let engine = Arc::new(engine);

        let err = fetcher(engine.clone(), dir.path())
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(engine.downloads.load(Ordering::SeqCst), 3);
        assert!(entries(dir.path()).is_empty(), "left {:?}", entries(dir.path()));
    }

    #[tokio::test]
    async fn test_engine_never_writes_into_output_dir() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new("clip"));

        fetcher(engine.clone(), dir.path())
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap();

        let seen = engine.output_dirs.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        for staged in seen {
            assert_ne!(staged, dir.path());
            assert_eq!(staged.parent(), Some(dir.path()));
            assert!(!staged.exists());
        }
    }

    #[tokio::test]
    async fn test_creates_output_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("voices/new");
        let engine = Arc::new(FakeEngine::new("clip"));
        let source = SourceDescriptor::new("https://youtu.be/abc123").with_output_dir(&nested);

        let outcome = fetcher(engine, dir.path()).fetch(&source).await.unwrap();
        assert_eq!(outcome.path(), nested.join("clip.wav"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let dir = tempdir().unwrap();
        let mut engine = FakeEngine::new("Test Clip #1");
        engine.fail_downloads = 2;
        let engine = Arc::new(engine);

        let start = tokio::time::Instant::now();
        let outcome = fetcher(engine.clone(), dir.path())
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::Downloaded(_)));
        assert_eq!(engine.downloads.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(entries(dir.path()), vec!["test_clip_1.wav"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let dir = tempdir().unwrap();
        let mut engine = FakeEngine::new("Test Clip #1");
        engine.fail_downloads = u32::MAX;
        let engine = Arc::new(engine);

        let start = tokio::time::Instant::now();
        let err = fetcher(engine.clone(), dir.path())
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert!(err.source.to_string().contains("fragment 3 not found"));
        assert_eq!(engine.resolves.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(1 + 4));
        assert!(entries(dir.path()).is_empty(), "left {:?}", entries(dir.path()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_identity_rotates_between_attempts() {
        let dir = tempdir().unwrap();
        let mut engine = FakeEngine::new("clip");
        engine.fail_resolves = 2;
        let engine = Arc::new(engine);

        fetcher(engine.clone(), dir.path())
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap();

        let agents = engine.agents.lock().unwrap().clone();
        assert_eq!(agents.len(), 3);
        assert_ne!(agents[0], agents[1]);
        assert_ne!(agents[1], agents[2]);
    }

    #[tokio::test]
    async fn test_events_are_reported() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::new("clip"));
        let (tx, mut rx) = mpsc::channel(32);

        let fetcher = fetcher(engine, dir.path()).with_events(tx);
        fetcher
            .fetch(&SourceDescriptor::new("https://youtu.be/abc123"))
            .await
            .unwrap();
        drop(fetcher);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&FetchEvent::Resolving { attempt: 1 }));
        assert!(events.contains(&FetchEvent::Downloading { percent: 100.0 }));
        assert_eq!(
            events.last(),
            Some(&FetchEvent::Downloaded {
                path: dir.path().join("clip.wav")
            })
        );
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(RetryState::backoff(1), Duration::from_secs(1));
        assert_eq!(RetryState::backoff(2), Duration::from_secs(4));
        assert_eq!(RetryState::backoff(3), Duration::from_secs(9));
    }

    #[test]
    fn test_next_attempt_config_is_pure() {
        let mut rng = StdRng::seed_from_u64(7);
        let settings = FetchSettings::default();
        let first = initial_attempt_config(&settings, Path::new("data"), &mut rng);
        let snapshot = first.clone();

        for attempt in 2..50 {
            let next = next_attempt_config(&first, attempt, &mut rng);
            assert_eq!(first, snapshot);
            assert_eq!(next.attempt, attempt);
            assert_ne!(next.user_agent, first.user_agent);
            assert!(settings.user_agents.contains(&next.user_agent));
            assert!((1.0..5.0).contains(&next.retry_sleep_secs));
            assert_eq!(next.output_dir, first.output_dir);
            assert_eq!(next.fragment_retries, 10);
        }
    }

    #[test]
    fn test_single_agent_pool_keeps_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let settings = FetchSettings {
            user_agents: vec!["only-agent".to_string()],
            ..FetchSettings::default()
        };
        let first = initial_attempt_config(&settings, Path::new("data"), &mut rng);
        let next = next_attempt_config(&first, 2, &mut rng);
        assert_eq!(next.user_agent, "only-agent");
    }

    #[test]
    fn test_retry_state_gives_up_at_max() {
        let mut rng = StdRng::seed_from_u64(3);
        let first = initial_attempt_config(&FetchSettings::default(), Path::new("data"), &mut rng);
        let mut state = RetryState::new(3, first);

        let fail = || DownloadError::InvalidUrl("x".to_string());
        assert!(matches!(
            state.record_failure(fail(), &mut rng),
            RetryDecision::Retry { delay } if delay == Duration::from_secs(1)
        ));
        assert!(matches!(
            state.record_failure(fail(), &mut rng),
            RetryDecision::Retry { delay } if delay == Duration::from_secs(4)
        ));
        match state.record_failure(fail(), &mut rng) {
            RetryDecision::GiveUp(err) => assert_eq!(err.attempts, 3),
            other => panic!("expected give up, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_custom_name_is_ignored() {
        let source = SourceDescriptor::new("u").with_name("   ");
        assert_eq!(source.custom_name(), None);
        let source = SourceDescriptor::new("u").with_name(" Alice ");
        assert_eq!(source.custom_name(), Some("Alice"));
    }
}
