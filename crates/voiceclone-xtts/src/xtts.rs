//! Coqui XTTS inference through a Python subprocess

use crate::{Device, SynthesisError};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Arguments: text, speaker wav, language, output path, model, device
const SCRIPT: &str = r#"
import sys

text, speaker_wav, language, output, model_name, device = sys.argv[1:7]

try:
    import torch
    from TTS.api import TTS
except ImportError as e:
    print(f"Missing dependency: {e}", file=sys.stderr)
    sys.exit(10)

if device == "auto":
    device = "cuda" if torch.cuda.is_available() else "cpu"

try:
    tts = TTS(model_name).to(device)
except Exception as e:
    print(f"Failed to load {model_name}: {e}", file=sys.stderr)
    sys.exit(2)

try:
    wav = tts.tts(text=text, speaker_wav=speaker_wav, language=language)
except Exception as e:
    print(f"Inference failed: {e}", file=sys.stderr)
    sys.exit(3)

try:
    tts.synthesizer.save_wav(wav=wav, path=output)
    print(f"Saved {output} on {device}")
except Exception as e:
    print(f"Failed to save output: {e}", file=sys.stderr)
    sys.exit(4)
"#;

const IMPORT_CHECK: &str = "import TTS.api";

#[derive(Debug)]
pub struct Xtts {
    python_path: PathBuf,
}

impl Xtts {
    pub fn new(python_path: PathBuf) -> Self {
        Self { python_path }
    }

    /// Whether the interpreter can import Coqui TTS
    pub async fn is_installed(&self) -> bool {
        Command::new(&self.python_path)
            .args(["-c", IMPORT_CHECK])
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub async fn run(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        output: &Path,
        model: &str,
        device: Device,
    ) -> Result<(), SynthesisError> {
        info!("Running XTTS inference ({})", model);

        let result = Command::new(&self.python_path)
            .args(["-c", SCRIPT])
            .arg(text)
            .arg(speaker_wav)
            .arg(language)
            .arg(output)
            .arg(model)
            .arg(device.as_arg())
            // XTTS otherwise blocks on an interactive license prompt
            .env("COQUI_TOS_AGREED", "1")
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SynthesisError::PythonNotFound,
                _ => SynthesisError::Io(e),
            })?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        let stderr = String::from_utf8_lossy(&result.stderr);

        if !stdout.is_empty() {
            debug!("XTTS stdout: {}", stdout);
        }
        if !stderr.is_empty() {
            debug!("XTTS stderr: {}", stderr);
        }

        if !result.status.success() {
            return Err(exit_error(result.status.code(), stderr.trim()));
        }

        info!("XTTS synthesis complete");
        Ok(())
    }
}

fn exit_error(code: Option<i32>, stderr: &str) -> SynthesisError {
    // Only the last line is ours; earlier lines are library noise
    let message = stderr.lines().last().unwrap_or("").to_string();
    // Python exits 1 on any uncaught exception, so the script avoids it
    match code {
        Some(10) => SynthesisError::TtsNotInstalled,
        Some(2) => SynthesisError::ModelLoad(message),
        Some(3) => SynthesisError::Inference(message),
        Some(4) => SynthesisError::Save(message),
        _ => SynthesisError::Failed {
            code,
            stderr: message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert!(matches!(exit_error(Some(10), ""), SynthesisError::TtsNotInstalled));
        match exit_error(Some(2), "loading...\nFailed to load xtts: no such model") {
            SynthesisError::ModelLoad(msg) => assert_eq!(msg, "Failed to load xtts: no such model"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(exit_error(Some(3), "x"), SynthesisError::Inference(_)));
        assert!(matches!(exit_error(Some(4), "x"), SynthesisError::Save(_)));
        assert!(matches!(
            exit_error(None, "killed"),
            SynthesisError::Failed { code: None, .. }
        ));
    }

    #[test]
    fn test_uncaught_exception_is_not_a_missing_install() {
        let stderr = "Traceback (most recent call last):\nNameError: name 'wav' is not defined";
        match exit_error(Some(1), stderr) {
            SynthesisError::Failed { code, stderr } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "NameError: name 'wav' is not defined");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(SCRIPT.contains("sys.exit(10)"));
        assert!(!SCRIPT.contains("sys.exit(1)\n"));
    }

    #[test]
    fn test_script_reads_all_arguments() {
        assert!(SCRIPT.contains("sys.argv[1:7]"));
        assert!(SCRIPT.contains("sys.exit(4)"));
    }

    #[tokio::test]
    async fn test_missing_python() {
        let xtts = Xtts::new(PathBuf::from("/nonexistent/python3"));
        assert!(!xtts.is_installed().await);
        let err = xtts
            .run("hi", Path::new("a.wav"), "en", Path::new("o.wav"), "m", Device::Cpu)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::PythonNotFound));
    }
}
