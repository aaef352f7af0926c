use anyhow::Result;
use std::path::Path;
use std::process::Command;
use voiceclone_core::config::{venv_python_candidates, Config};
use voiceclone_core::voices::VoiceLibrary;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("voiceclone dependency check\n");

    let mut all_ok = true;

    // Check yt-dlp
    print!("yt-dlp:        ");
    match config.yt_dlp_path() {
        Ok(path) => match Command::new(&path).arg("--version").output() {
            Ok(out) => {
                let v = String::from_utf8_lossy(&out.stdout);
                println!("OK ({})", v.trim());
            }
            Err(_) => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("           Install with: pip install yt-dlp");
            all_ok = false;
        }
    }

    // Check FFmpeg
    print!("ffmpeg:        ");
    match config.ffmpeg_path() {
        Ok(path) => match Command::new(&path).arg("-version").output() {
            Ok(out) => {
                let first_line = String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .next()
                    .unwrap_or("")
                    .to_string();
                // "ffmpeg version 6.1.1 Copyright ..."
                let version_part = first_line.split_whitespace().nth(2).unwrap_or("unknown");
                println!("OK ({})", version_part);
            }
            Err(_) => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("           Install with: brew install ffmpeg (or apt install ffmpeg)");
            all_ok = false;
        }
    }

    // Check Python
    print!("python3:       ");
    match config.python_path() {
        Ok(python) => {
            let in_venv = venv_python_candidates().contains(&python);
            match Command::new(&python).arg("--version").output() {
                Ok(out) => {
                    let v = String::from_utf8_lossy(&out.stdout);
                    let kind = if in_venv { "venv" } else { "system" };
                    println!("OK ({}, {})", v.trim().replace("Python ", ""), kind);
                }
                Err(_) => {
                    println!("FOUND but failed to get version");
                    all_ok = false;
                }
            }

            // Check Coqui TTS
            print!("  TTS:         ");
            let check = Command::new(&python)
                .args(["-c", "import TTS; print(TTS.__version__)"])
                .output();
            match check {
                Ok(out) if out.status.success() => {
                    println!("OK ({})", String::from_utf8_lossy(&out.stdout).trim());
                }
                _ => {
                    println!("NOT INSTALLED");
                    println!("               Run: voiceclone setup");
                    all_ok = false;
                }
            }

            // Check torch and CUDA
            print!("  torch:       ");
            let check = Command::new(&python)
                .args([
                    "-c",
                    "import torch; print(torch.__version__, 'cuda' if torch.cuda.is_available() else 'cpu')",
                ])
                .output();
            match check {
                Ok(out) if out.status.success() => {
                    println!("OK ({})", String::from_utf8_lossy(&out.stdout).trim());
                }
                _ => {
                    println!("NOT INSTALLED");
                    println!("               Run: voiceclone setup");
                    all_ok = false;
                }
            }
        }
        Err(_) => {
            println!("NOT FOUND");
            println!("           Install Python 3.9+, then run: voiceclone setup");
            all_ok = false;
        }
    }

    // Voice library
    print!("voices:        ");
    match VoiceLibrary::new(&config.voices.directory).list() {
        Ok(voices) => println!(
            "{} in {}",
            voices.len(),
            config.voices.directory.display()
        ),
        Err(e) => {
            println!("UNREADABLE ({})", e);
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}
