//! In-memory PCM audio and WAV I/O

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Decoded audio held in memory while a single operation works on it.
///
/// Samples are interleaved and normalized to \[-1.0, 1.0\]. The original WAV
/// bit depth and sample format are kept so that a trimmed clip is written
/// back in the same encoding it was read in.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_format: SampleFormat,
}

impl AudioBuffer {
    /// 16-bit integer PCM buffer, the format ffmpeg produces for voice samples
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Duration in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First sample frame at or after `ms`
    pub fn frame_at_ms(&self, ms: u64) -> usize {
        let frame = ms * self.sample_rate as u64 / 1000;
        (frame as usize).min(self.frames())
    }

    /// Copy of the `[start_ms, end_ms)` span
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let channels = self.channels.max(1) as usize;
        let start = self.frame_at_ms(start_ms) * channels;
        let end = self.frame_at_ms(end_ms).max(self.frame_at_ms(start_ms)) * channels;
        AudioBuffer {
            samples: self.samples[start..end].to_vec(),
            ..*self
        }
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: self.sample_format,
        }
    }

    /// Load from WAV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, hound::Error> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        // Durations and frame offsets divide by both
        if spec.sample_rate == 0 {
            return Err(hound::Error::FormatError("sample rate is zero"));
        }
        if spec.channels == 0 {
            return Err(hound::Error::FormatError("file contains no channels"));
        }

        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
            SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<_, _>>()?
            }
        };

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            sample_format: spec.sample_format,
        })
    }

    /// Save to WAV file in the buffer's own encoding
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), hound::Error> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }

    /// Write WAV data to any seekable sink
    pub fn write_to<W>(&self, sink: W) -> Result<(), hound::Error>
    where
        W: std::io::Write + std::io::Seek,
    {
        let spec = self.spec();
        let mut writer = WavWriter::new(sink, spec)?;

        match spec.sample_format {
            SampleFormat::Float => {
                for &sample in &self.samples {
                    writer.write_sample(sample)?;
                }
            }
            SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
                for &sample in &self.samples {
                    let scaled = (sample * max_val).round().clamp(-max_val, max_val - 1.0);
                    match spec.bits_per_sample {
                        8 => writer.write_sample(scaled as i8)?,
                        16 => writer.write_sample(scaled as i16)?,
                        _ => writer.write_sample(scaled as i32)?,
                    }
                }
            }
        }

        writer.finalize()
    }
}
