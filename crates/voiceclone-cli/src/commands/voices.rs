use anyhow::Result;
use std::path::Path;

use voiceclone_core::{config::Config, voices::VoiceLibrary};

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let library = VoiceLibrary::new(&config.voices.directory);
    let voices = library.list()?;

    if voices.is_empty() {
        println!("No voices in {}", library.directory().display());
        println!("Add one with: voiceclone fetch <URL> --name <NAME>");
        return Ok(());
    }

    println!("Voices in {}:\n", library.directory().display());
    for (i, voice) in voices.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, voice.name);
    }
    Ok(())
}
