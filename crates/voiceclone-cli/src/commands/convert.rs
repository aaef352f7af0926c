use anyhow::Result;
use std::path::Path;

use crate::args::Format;
use voiceclone_core::{config::Config, converter::Converter};

pub async fn run(
    path: &Path,
    bitrate: Option<String>,
    format: Option<Format>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_path)?;

    let mut settings = config.convert.clone();
    if let Some(bitrate) = bitrate {
        settings.bitrate = bitrate;
    }
    if let Some(format) = format {
        settings.format = format.name().to_string();
    }

    let converter = Converter::new(config.ffmpeg_path()?);
    let output = converter.convert(path, &settings).await?;

    println!("Converted: {}", output.display());
    Ok(())
}
