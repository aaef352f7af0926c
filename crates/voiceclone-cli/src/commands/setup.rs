use anyhow::{Context, Result};
use std::process::Command;
use which::which;

pub async fn run() -> Result<()> {
    println!("Setting up Python environment for speech synthesis...\n");

    let data_dir = dirs::data_dir()
        .context("Could not determine data directory")?
        .join("voiceclone");

    let venv_dir = data_dir.join("venv");
    let venv_python = venv_dir.join("bin/python");
    let venv_pip = venv_dir.join("bin/pip");

    let python = which("python3").context("Python 3 not found. Install Python 3.9-3.11 first")?;

    if !venv_dir.exists() {
        println!("Creating virtual environment at {}...", venv_dir.display());
        std::fs::create_dir_all(&data_dir)?;

        let status = Command::new(&python)
            .args(["-m", "venv"])
            .arg(&venv_dir)
            .status()
            .context("Failed to create virtual environment")?;

        if !status.success() {
            anyhow::bail!("Failed to create virtual environment");
        }
        println!("Virtual environment created.\n");
    } else {
        println!("Virtual environment exists at {}\n", venv_dir.display());
    }

    println!("Upgrading pip...");
    let status = Command::new(&venv_pip)
        .args(["install", "--upgrade", "pip"])
        .status()
        .context("Failed to upgrade pip")?;

    if !status.success() {
        anyhow::bail!("Failed to upgrade pip");
    }

    let packages = ["torch>=2.1.0", "coqui-tts>=0.24.0", "yt-dlp"];

    println!("\nInstalling Python packages...");
    let mut failed = Vec::new();
    for package in packages {
        let name = package.split(">=").next().unwrap_or(package);
        print!("  Installing {}... ", name);
        let status = Command::new(&venv_pip)
            .args(["install", package])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();

        match status {
            Ok(s) if s.success() => println!("OK"),
            _ => {
                println!("FAILED");
                failed.push(name);
            }
        }
    }

    // Fetch model weights now rather than on the first `speak`
    println!("\nDownloading XTTS v2 model (about 1.8 GB)...");
    let download_script = format!(
        "from TTS.utils.manage import ModelManager\nModelManager().download_model('{}')",
        voiceclone_xtts::DEFAULT_MODEL
    );
    let status = Command::new(&venv_python)
        .args(["-c", &download_script])
        .env("COQUI_TOS_AGREED", "1")
        .status()
        .context("Failed to download XTTS model")?;

    if !status.success() {
        println!("Warning: Failed to download the model. It will be downloaded on first use.");
    }

    println!("\n=== Setup Complete ===");
    if !failed.is_empty() {
        println!("Failed packages: {}", failed.join(", "));
    }
    println!("Run 'voiceclone doctor' to verify installation.");

    Ok(())
}
