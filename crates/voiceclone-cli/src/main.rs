mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "voiceclone=info,voiceclone_core=info,voiceclone_xtts=info",
        1 => "voiceclone=debug,voiceclone_core=debug,voiceclone_xtts=debug",
        2 => "voiceclone=trace,voiceclone_core=trace,voiceclone_xtts=trace",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Fetch {
            url,
            name,
            output_dir,
        } => commands::fetch::run(&url, name, output_dir, config_path).await,
        Commands::Import { file, name } => {
            commands::import::run(&file, name.as_deref(), config_path).await
        }
        Commands::Trim {
            path,
            min_silence,
            silence_thresh,
        } => commands::trim::run(&path, min_silence, silence_thresh, config_path).await,
        Commands::Convert {
            path,
            bitrate,
            format,
        } => commands::convert::run(&path, bitrate, format, config_path).await,
        Commands::Speak {
            voice,
            text,
            language,
            out,
            device,
            mp3,
        } => {
            let options = commands::speak::SpeakOptions {
                voice,
                text,
                language,
                out,
                device: device.into(),
                mp3,
            };
            commands::speak::run(options, config_path).await
        }
        Commands::Voices => commands::voices::run(config_path).await,
        Commands::Doctor => commands::doctor::run(config_path).await,
        Commands::Setup => commands::setup::run().await,
        Commands::Config => commands::config::run(config_path).await,
    }
}
