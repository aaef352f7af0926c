//! Configuration management for voiceclone

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub voices: VoicesConfig,
    pub fetch: FetchSettings,
    pub trim: TrimSettings,
    pub convert: ConvertSettings,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
    /// Path to Python binary (auto-detected if not set)
    pub python: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicesConfig {
    /// Directory holding one `.wav` reference sample per voice
    pub directory: PathBuf,
}

/// Knobs for the outer retry loop and the per-attempt yt-dlp options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Resolve-and-download attempts before giving up
    pub max_attempts: u32,
    /// Retries performed by yt-dlp itself for HTTP errors
    pub transfer_retries: u32,
    /// Retries performed by yt-dlp for individual fragments
    pub fragment_retries: u32,
    /// Lower bound (inclusive) of the randomized inter-retry sleep, seconds
    pub retry_sleep_min_secs: f64,
    /// Upper bound (exclusive) of the randomized inter-retry sleep, seconds
    pub retry_sleep_max_secs: f64,
    /// Local address to bind outgoing connections to
    pub source_address: String,
    /// Pool of client signatures rotated between attempts
    pub user_agents: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimSettings {
    /// Shortest run of quiet audio that counts as silence, milliseconds
    pub min_silence_ms: u32,
    /// Silence threshold in dBFS (negative; lower is quieter)
    pub silence_thresh_db: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertSettings {
    /// Target bitrate passed to the encoder, e.g. "192k"
    pub bitrate: String,
    /// Target lossy format: "mp3", "aac" or "opus"
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Coqui TTS model identifier
    pub model: String,
    /// Two-letter language code
    pub language: String,
    /// Sentence spoken when no text is given
    pub sentence: String,
    /// Reference voice used when none is selected
    pub speaker_wav: Option<PathBuf>,
    /// Where synthesized speech is written
    pub output: PathBuf,
}

pub const DEFAULT_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36 Edg/91.0.864.59",
];

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            transfer_retries: 10,
            fragment_retries: 10,
            retry_sleep_min_secs: 1.0,
            retry_sleep_max_secs: 5.0,
            source_address: "0.0.0.0".to_string(),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            min_silence_ms: 100,
            silence_thresh_db: -40,
        }
    }
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            bitrate: "192k".to_string(),
            format: "mp3".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            voices: VoicesConfig {
                directory: PathBuf::from("data"),
            },
            fetch: FetchSettings::default(),
            trim: TrimSettings::default(),
            convert: ConvertSettings::default(),
            synthesis: SynthesisConfig {
                model: "tts_models/multilingual/multi-dataset/xtts_v2".to_string(),
                language: "en".to_string(),
                sentence: "Hello there mortal!".to_string(),
                speaker_wav: None,
                output: PathBuf::from("output/out.wav"),
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(config_dir) = dirs::config_dir() {
            let default_config = config_dir.join("voiceclone/config.toml");
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::LoadError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        // VOICECLONE_TRIM__MIN_SILENCE_MS -> trim.min_silence_ms
        figment = figment.merge(Env::prefixed("VOICECLONE_").split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "fetch.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.fetch.user_agents.is_empty() {
            return Err(ConfigError::InvalidValue(
                "fetch.user_agents must not be empty".to_string(),
            ));
        }
        let (min, max) = (self.fetch.retry_sleep_min_secs, self.fetch.retry_sleep_max_secs);
        if !(min >= 0.0 && min < max) {
            return Err(ConfigError::InvalidValue(format!(
                "fetch retry sleep range [{}, {}) is empty",
                min, max
            )));
        }
        if self.trim.silence_thresh_db > 0 {
            return Err(ConfigError::InvalidValue(
                "trim.silence_thresh_db must be <= 0 dBFS".to_string(),
            ));
        }
        Ok(())
    }

    /// Get yt-dlp path, preferring the one `voiceclone setup` installs
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        locate(
            self.paths.yt_dlp.as_ref(),
            venv_executable_candidates("yt-dlp"),
            "yt-dlp",
        )
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.ffmpeg {
            Ok(path.clone())
        } else {
            which::which("ffmpeg")
                .map_err(|_| ConfigError::InvalidValue("ffmpeg not found in PATH".to_string()))
        }
    }

    /// Get Python path, preferring the voiceclone venv if available
    pub fn python_path(&self) -> Result<PathBuf, ConfigError> {
        locate(self.paths.python.as_ref(), venv_python_candidates(), "python3")
    }
}

/// Configured path, then the first existing venv candidate, then `PATH`
fn locate(
    configured: Option<&PathBuf>,
    venv: Vec<PathBuf>,
    name: &str,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = configured {
        return Ok(path.clone());
    }
    if let Some(path) = venv.into_iter().find(|p| p.exists()) {
        return Ok(path);
    }
    which::which(name)
        .map_err(|_| ConfigError::InvalidValue(format!("{} not found in PATH", name)))
}

/// Where `voiceclone setup` may have installed `name` in its virtual environment
pub fn venv_executable_candidates(name: &str) -> Vec<PathBuf> {
    [
        dirs::data_dir().map(|d| d.join("voiceclone/venv/bin")),
        dirs::home_dir().map(|d| d.join(".local/share/voiceclone/venv/bin")),
    ]
    .into_iter()
    .flatten()
    .map(|bin| bin.join(name))
    .collect()
}

pub fn venv_python_candidates() -> Vec<PathBuf> {
    venv_executable_candidates("python")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.voices.directory, PathBuf::from("data"));
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.user_agents.len(), 5);
        assert_eq!(config.trim.min_silence_ms, 100);
        assert_eq!(config.trim.silence_thresh_db, -40);
        assert_eq!(config.convert.bitrate, "192k");
        assert_eq!(config.synthesis.output, PathBuf::from("output/out.wav"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[trim]\nmin_silence_ms = 250\nsilence_thresh_db = -50\n\n[voices]\ndirectory = \"voices\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.trim.min_silence_ms, 250);
        assert_eq!(config.trim.silence_thresh_db, -50);
        assert_eq!(config.voices.directory, PathBuf::from("voices"));
        assert_eq!(config.fetch.max_attempts, 3);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn test_validate_rejects_empty_agent_pool() {
        let mut config = Config::default();
        config.fetch.user_agents.clear();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_venv_yt_dlp_is_preferred_over_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone/bin/yt-dlp");
        let installed = dir.path().join("venv/bin/yt-dlp");
        std::fs::create_dir_all(installed.parent().unwrap()).unwrap();
        std::fs::write(&installed, b"").unwrap();

        let found = locate(None, vec![missing, installed.clone()], "yt-dlp").unwrap();
        assert_eq!(found, installed);

        let pinned = PathBuf::from("/opt/bin/yt-dlp");
        let found = locate(Some(&pinned), vec![installed], "yt-dlp").unwrap();
        assert_eq!(found, pinned);
    }

    #[test]
    fn test_venv_candidates_share_the_setup_layout() {
        for path in venv_executable_candidates("yt-dlp") {
            assert!(path.ends_with("voiceclone/venv/bin/yt-dlp"), "{}", path.display());
        }
        for path in venv_python_candidates() {
            assert!(path.ends_with("voiceclone/venv/bin/python"), "{}", path.display());
        }
    }

    #[test]
    fn test_locate_reports_missing_tool() {
        let err = locate(None, Vec::new(), "voiceclone-no-such-tool").unwrap_err();
        assert!(err.to_string().contains("voiceclone-no-such-tool"));
    }

    #[test]
    fn test_validate_rejects_inverted_sleep_range() {
        let mut config = Config::default();
        config.fetch.retry_sleep_min_secs = 5.0;
        config.fetch.retry_sleep_max_secs = 1.0;
        assert!(config.validate().is_err());
    }
}
