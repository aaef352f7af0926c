use anyhow::{bail, Result};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Duration;

use voiceclone_core::{
    config::{Config, ConvertSettings},
    converter::Converter,
    voices::VoiceLibrary,
};
use voiceclone_xtts::{Device, SynthesisRequest, Synthesizer};

pub struct SpeakOptions {
    pub voice: Option<String>,
    pub text: Option<String>,
    pub language: Option<String>,
    pub out: Option<PathBuf>,
    pub device: Device,
    pub mp3: bool,
}

pub async fn run(options: SpeakOptions, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let library = VoiceLibrary::new(&config.voices.directory);

    let speaker_wav = match (&options.voice, &config.synthesis.speaker_wav) {
        (Some(voice), _) => library.resolve(voice)?,
        (None, Some(path)) => path.clone(),
        (None, None) => {
            let names: Vec<String> = library.list()?.into_iter().map(|v| v.name).collect();
            if names.is_empty() {
                bail!("No voices yet. Add one with: voiceclone fetch <URL> --name <NAME>");
            }
            bail!("Choose a voice with --voice: {}", names.join(", "));
        }
    };

    let request = SynthesisRequest::new(
        options.text.unwrap_or_else(|| config.synthesis.sentence.clone()),
        speaker_wav,
        options.out.unwrap_or_else(|| config.synthesis.output.clone()),
    )
    .language(
        options
            .language
            .unwrap_or_else(|| config.synthesis.language.clone()),
    )
    .model(config.synthesis.model.clone())
    .device(options.device);
    request.validate()?;

    println!("Speaker Voice:   {}", request.speaker_wav.display());
    println!("Language:        {}", request.language);
    println!("Target Sentence: {}\n", request.text);

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Synthesizing on {}...", request.device));

    let synthesizer = Synthesizer::new(config.python_path()?);
    let output = match synthesizer.synthesize(&request).await {
        Ok(output) => {
            spinner.finish_with_message(format!("Speech saved to {}", output.display()));
            output
        }
        Err(e) => {
            spinner.abandon_with_message("Synthesis failed");
            return Err(e.into());
        }
    };

    if options.mp3 {
        let converter = Converter::new(config.ffmpeg_path()?);
        let mp3 = converter.convert(&output, &mp3_settings(&config.convert)).await?;
        println!("Converted: {}", mp3.display());
    }

    Ok(())
}

/// `--mp3` keeps the configured bitrate but always encodes MP3
fn mp3_settings(convert: &ConvertSettings) -> ConvertSettings {
    ConvertSettings {
        format: "mp3".to_string(),
        ..convert.clone()
    }
}
