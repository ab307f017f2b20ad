use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec};

use crate::extract::TARGET_SAMPLE_RATE;

/// Whether `spec` is exactly the waveform profile the extractor produces.
pub fn is_normalized_spec(spec: &WavSpec) -> bool {
    spec.channels == 1
        && spec.sample_rate == TARGET_SAMPLE_RATE
        && spec.bits_per_sample == 16
        && spec.sample_format == SampleFormat::Int
}

/// Read normalized samples from `path` if it is a WAV file in the extractor's profile.
///
/// Returns `Ok(None)` for anything else (not a WAV, different rate/channels/depth) so the caller
/// can fall back to the general-purpose decoder.
pub fn read_if_normalized(path: &Path) -> Result<Option<Vec<f32>>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open waveform: {}", path.display()))?;
    samples_from_wav_reader(std::io::BufReader::new(file))
}

/// Load 16-bit mono 16 kHz WAV data from a reader as `f32` samples in `[-1.0, 1.0]`.
pub fn samples_from_wav_reader<R: Read>(reader: R) -> Result<Option<Vec<f32>>> {
    let Ok(reader) = WavReader::new(reader) else {
        return Ok(None);
    };

    if !is_normalized_spec(&reader.spec()) {
        return Ok(None);
    }

    // Most ASR backends expect audio in this normalized floating-point format.
    let samples = reader
        .into_samples::<i16>()
        .map(|s| s.map(|pcm| pcm as f32 / i16::MAX as f32))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .context("failed to read WAV samples")?;

    Ok(Some(samples))
}
