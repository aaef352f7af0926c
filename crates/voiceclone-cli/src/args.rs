use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "voiceclone")]
#[command(author, version, about = "Collect reference voices and speak in them")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a reference sample from a URL and trim its silence
    Fetch {
        /// Video URL (YouTube or anything yt-dlp supports)
        url: String,

        /// Name for the sample instead of the video title
        #[arg(short, long)]
        name: Option<String>,

        /// Directory to store the sample in (defaults to the voice library)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Add a local recording to the voice library
    Import {
        /// Audio file in any format ffmpeg can read
        file: PathBuf,

        /// Name for the sample instead of the file name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove leading and trailing silence from a WAV file in place
    Trim {
        path: PathBuf,

        /// Minimum silence length, milliseconds
        #[arg(long)]
        min_silence: Option<u32>,

        /// Silence threshold, dBFS
        #[arg(long, allow_hyphen_values = true)]
        silence_thresh: Option<i32>,
    },

    /// Convert a WAV file to a lossy format next to it
    Convert {
        path: PathBuf,

        /// Target bitrate, e.g. 192k
        #[arg(short, long)]
        bitrate: Option<String>,

        /// Target format
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },

    /// Speak text in a cloned voice
    Speak {
        /// Voice name from the library, or a path to a WAV sample
        #[arg(long)]
        voice: Option<String>,

        /// Text to speak (defaults to the configured sentence)
        #[arg(short, long)]
        text: Option<String>,

        /// Two-letter language code
        #[arg(short, long)]
        language: Option<String>,

        /// Output WAV path
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Inference device
        #[arg(long, value_enum, default_value = "auto")]
        device: DeviceArg,

        /// Also write an MP3 next to the WAV
        #[arg(long)]
        mp3: bool,
    },

    /// List voices in the library
    Voices,

    /// Check external dependencies
    Doctor,

    /// Create the Python environment and install Coqui TTS
    Setup,

    /// Show configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// MP3 - Lossy, widely compatible
    Mp3,
    /// AAC - Lossy, good quality/size ratio
    Aac,
    /// Opus - Lossy, best quality/size ratio
    Opus,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Mp3 => "mp3",
            Format::Aac => "aac",
            Format::Opus => "opus",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceArg {
    /// CUDA if available, otherwise CPU
    Auto,
    Cpu,
    Cuda,
}

impl From<DeviceArg> for voiceclone_xtts::Device {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Auto => voiceclone_xtts::Device::Auto,
            DeviceArg::Cpu => voiceclone_xtts::Device::Cpu,
            DeviceArg::Cuda => voiceclone_xtts::Device::Cuda,
        }
    }
}
