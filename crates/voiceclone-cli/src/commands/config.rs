use anyhow::Result;
use std::path::Path;
use voiceclone_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("voiceclone configuration\n");
    println!("{}", toml::to_string_pretty(&config)?);

    let detected = |found: Result<std::path::PathBuf, _>| match found {
        Ok(p) => p.display().to_string(),
        Err(_) => "(not found)".to_string(),
    };
    println!("Resolved tools:");
    println!("  yt_dlp = {}", detected(config.yt_dlp_path()));
    println!("  ffmpeg = {}", detected(config.ffmpeg_path()));
    println!("  python = {}", detected(config.python_path()));

    // Show config file locations
    println!("\nConfig sources (later ones win):");
    if let Some(config_dir) = dirs::config_dir() {
        println!("  1. {}/voiceclone/config.toml", config_dir.display());
    }
    if let Some(p) = config_path {
        println!("  2. {} (specified)", p.display());
    }
    println!("  3. Environment variables (VOICECLONE_*, nested keys joined with __)");

    Ok(())
}
