//! voiceclone-core: reference sample acquisition for voice cloning

pub mod audio;
pub mod config;
pub mod converter;
pub mod decoder;
pub mod downloader;
pub mod encoder;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod sanitize;
pub mod trimmer;
pub mod voices;

pub use config::Config;
pub use error::{Result, VoiceCloneError};
pub use fetcher::{FetchOutcome, SourceDescriptor};
pub use pipeline::{AcquisitionPipeline, PipelineStage};
pub use trimmer::TrimOutcome;
