//! Leading/trailing silence removal for reference samples

use crate::audio::AudioBuffer;
use crate::config::TrimSettings;
use crate::error::TrimError;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What [`trim`] did to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimOutcome {
    /// The file was rewritten to hold only `[start_ms, end_ms)` of the original
    Trimmed {
        path: PathBuf,
        start_ms: u64,
        end_ms: u64,
        original_ms: u64,
    },
    /// Nothing to cut (all silence, or no silence at either end); file untouched
    Unchanged { path: PathBuf },
}

impl TrimOutcome {
    pub fn path(&self) -> &Path {
        match self {
            TrimOutcome::Trimmed { path, .. } | TrimOutcome::Unchanged { path } => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            TrimOutcome::Trimmed { path, .. } | TrimOutcome::Unchanged { path } => path,
        }
    }
}

/// Trim leading and trailing silence from a WAV file in place.
///
/// Silence inside the clip is kept. When the detector finds no audible span
/// the file is left as it is rather than emptied.
pub fn trim(path: &Path, settings: &TrimSettings) -> Result<TrimOutcome, TrimError> {
    if !path.exists() {
        return Err(TrimError::NotFound(path.to_path_buf()));
    }

    let audio = AudioBuffer::load(path)?;
    let original_ms = audio.duration_ms();
    let spans = detect_nonsilent(&audio, settings);

    let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
        info!("No audible audio in {}, leaving it as is", path.display());
        return Ok(TrimOutcome::Unchanged {
            path: path.to_path_buf(),
        });
    };
    let (start_ms, end_ms) = (first.start, last.end);

    if start_ms == 0 && end_ms >= original_ms {
        debug!("No leading or trailing silence in {}", path.display());
        return Ok(TrimOutcome::Unchanged {
            path: path.to_path_buf(),
        });
    }

    info!(
        "Trimming {} to {}ms..{}ms of {}ms",
        path.display(),
        start_ms,
        end_ms,
        original_ms
    );
    let trimmed = audio.slice_ms(start_ms, end_ms);
    overwrite(path, &trimmed)?;

    Ok(TrimOutcome::Trimmed {
        path: path.to_path_buf(),
        start_ms,
        end_ms,
        original_ms,
    })
}

/// Replace `path` with `audio` via a sibling temp file so readers never see a
/// half-written WAV.
fn overwrite(path: &Path, audio: &AudioBuffer) -> Result<(), TrimError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    audio.write_to(std::io::BufWriter::new(tmp.as_file_mut()))?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Millisecond spans whose energy stays above the silence threshold.
///
/// A window of `min_silence_ms` slides in 1ms steps; a window is silent when
/// its RMS over all channels is at or below `silence_thresh_db` dBFS.
/// Overlapping silent windows merge into silent ranges and the returned spans
/// are what lies between them. Clips shorter than one window are judged as a
/// whole.
pub fn detect_nonsilent(audio: &AudioBuffer, settings: &TrimSettings) -> Vec<Range<u64>> {
    let len_ms = audio.duration_ms();
    if len_ms == 0 {
        return Vec::new();
    }

    let silent = detect_silence(audio, settings);
    if silent.is_empty() {
        return vec![0..len_ms];
    }
    if silent[0].start == 0 && silent[0].end >= len_ms {
        return Vec::new();
    }

    let mut spans = Vec::with_capacity(silent.len() + 1);
    let mut prev_end = 0;
    for range in &silent {
        if range.start > prev_end {
            spans.push(prev_end..range.start);
        }
        prev_end = range.end;
    }
    if prev_end < len_ms {
        spans.push(prev_end..len_ms);
    }
    spans
}

/// Silent millisecond ranges, merged
pub fn detect_silence(audio: &AudioBuffer, settings: &TrimSettings) -> Vec<Range<u64>> {
    let len_ms = audio.duration_ms();
    let window = settings.min_silence_ms.max(1) as u64;
    let threshold = db_to_amplitude(settings.silence_thresh_db) as f64;

    let (energy, counts) = cumulative_energy(audio, len_ms);
    let window_rms = |start: u64, end: u64| -> f64 {
        let (s, e) = (start as usize, end as usize);
        let n = counts[e] - counts[s];
        if n == 0 {
            return 0.0;
        }
        ((energy[e] - energy[s]) / n as f64).sqrt()
    };

    if len_ms < window {
        return if window_rms(0, len_ms) <= threshold {
            vec![0..len_ms]
        } else {
            Vec::new()
        };
    }

    let silence_starts: Vec<u64> = (0..=len_ms - window)
        .filter(|&start| window_rms(start, start + window) <= threshold)
        .collect();

    let Some((&first, rest)) = silence_starts.split_first() else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    let mut range_start = first;
    let mut prev = first;
    for &start in rest {
        let continuous = start == prev + 1;
        let has_gap = start > prev + window;
        if !continuous && has_gap {
            ranges.push(range_start..prev + window);
            range_start = start;
        }
        prev = start;
    }
    ranges.push(range_start..prev + window);

    debug!("Detected {} silent range(s) in {}ms", ranges.len(), len_ms);
    ranges
}

/// Prefix sums of squared samples and sample counts, one slot per millisecond
fn cumulative_energy(audio: &AudioBuffer, len_ms: u64) -> (Vec<f64>, Vec<u64>) {
    let channels = audio.channels.max(1) as usize;
    let mut energy = Vec::with_capacity(len_ms as usize + 1);
    let mut counts = Vec::with_capacity(len_ms as usize + 1);
    energy.push(0.0);
    counts.push(0);

    for ms in 0..len_ms {
        let start = audio.frame_at_ms(ms) * channels;
        let end = audio.frame_at_ms(ms + 1) * channels;
        let chunk = &audio.samples[start..end];
        let sum: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();

        energy.push(energy[ms as usize] + sum);
        counts.push(counts[ms as usize] + chunk.len() as u64);
    }

    (energy, counts)
}

fn db_to_amplitude(db: i32) -> f32 {
    10f32.powf(db as f32 / 20.0)
}
