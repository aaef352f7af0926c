//! The directory of reference samples available for cloning

use crate::error::{Result, VoiceCloneError};
use crate::sanitize::{sanitize, SAMPLE_EXTENSION};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSample {
    /// File stem, e.g. `morgan_freeman`
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct VoiceLibrary {
    directory: PathBuf,
}

impl VoiceLibrary {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// All `.wav` samples in the library, sorted by name.
    ///
    /// The directory is created when missing, so a fresh install lists nothing
    /// instead of failing.
    pub fn list(&self) -> Result<Vec<VoiceSample>> {
        std::fs::create_dir_all(&self.directory)?;

        let mut samples = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            let is_sample = path.is_file()
                && path
                    .extension()
                    .is_some_and(|e| e.eq_ignore_ascii_case(SAMPLE_EXTENSION));
            if !is_sample {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            // In-progress imports are staged as hidden files
            if name.starts_with('.') {
                continue;
            }
            samples.push(VoiceSample { name, path });
        }

        samples.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Found {} voices in {}", samples.len(), self.directory.display());
        Ok(samples)
    }

    /// Find a sample by voice name or by path.
    ///
    /// An existing file path wins; otherwise `name_or_path` is sanitized the
    /// same way fetched samples are and looked up in the library.
    pub fn resolve(&self, name_or_path: &str) -> Result<PathBuf> {
        let direct = Path::new(name_or_path);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        let candidate = self.directory.join(sanitize(name_or_path));
        if candidate.is_file() {
            return Ok(candidate);
        }

        Err(VoiceCloneError::NotFound(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_sorted_wav_only() {
        let dir = tempdir().unwrap();
        for name in ["zoe.wav", "adam.wav", "notes.txt", "mike.WAV", "clip.mp3", ".import-x1.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.wav")).unwrap();

        let names: Vec<String> = VoiceLibrary::new(dir.path())
            .list()
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["adam", "mike", "zoe"]);
    }

    #[test]
    fn test_list_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let voices = dir.path().join("data");
        let library = VoiceLibrary::new(&voices);

        assert!(library.list().unwrap().is_empty());
        assert!(voices.is_dir());
    }

    #[test]
    fn test_resolve_by_name() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("morgan_freeman.wav"), b"").unwrap();
        let library = VoiceLibrary::new(dir.path());

        assert_eq!(
            library.resolve("morgan_freeman").unwrap(),
            dir.path().join("morgan_freeman.wav")
        );
        assert_eq!(
            library.resolve("Morgan Freeman").unwrap(),
            dir.path().join("morgan_freeman.wav")
        );
    }

    #[test]
    fn test_resolve_by_path() {
        let dir = tempdir().unwrap();
        let elsewhere = dir.path().join("elsewhere.wav");
        std::fs::write(&elsewhere, b"").unwrap();
        let library = VoiceLibrary::new(dir.path().join("data"));

        assert_eq!(library.resolve(elsewhere.to_str().unwrap()).unwrap(), elsewhere);
    }

    #[test]
    fn test_resolve_unknown_voice() {
        let dir = tempdir().unwrap();
        let err = VoiceLibrary::new(dir.path()).resolve("nobody").unwrap_err();
        assert!(matches!(err, VoiceCloneError::NotFound(p) if p.ends_with("nobody.wav")));
    }
}
