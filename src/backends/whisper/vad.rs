use anyhow::{Context, Result};
use whisper_rs::{WhisperVadContext, WhisperVadParams};

use crate::extract::TARGET_SAMPLE_RATE;

/// Padding kept around each detected speech region, in milliseconds.
const SPEECH_PAD_MS: u32 = 200;

/// Mute everything outside the speech regions found by the VAD model.
///
/// The buffer keeps its length so timestamps still line up with the original media.
/// Returns `Ok(false)` when no speech was found at all.
pub(super) fn mute_non_speech(ctx: &mut WhisperVadContext, samples: &mut [f32]) -> Result<bool> {
    let segments = ctx
        .segments_from_samples(WhisperVadParams::default(), samples)
        .context("voice activity detection failed")?;

    let mut spans = Vec::new();
    for i in 0..segments.num_segments() {
        // Timestamps are in centiseconds.
        let start = segments
            .get_segment_start_timestamp(i)
            .with_context(|| format!("missing start timestamp for VAD segment {i}"))?;
        let end = segments
            .get_segment_end_timestamp(i)
            .with_context(|| format!("missing end timestamp for VAD segment {i}"))?;
        spans.push((start / 100.0, end / 100.0));
    }

    let ranges = speech_ranges(&spans, samples.len());
    if ranges.is_empty() {
        return Ok(false);
    }

    zero_outside(samples, &ranges);
    Ok(true)
}

/// Convert speech spans (seconds) into padded, merged, sorted sample ranges.
fn speech_ranges(spans: &[(f32, f32)], len: usize) -> Vec<(usize, usize)> {
    let rate = TARGET_SAMPLE_RATE as f32;
    let pad = (SPEECH_PAD_MS as f32 / 1000.0 * rate) as usize;

    let mut ranges: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for &(start, end) in spans {
        let start_idx = ((start * rate).floor() as usize).saturating_sub(pad).min(len);
        let end_idx = ((end * rate).ceil() as usize).saturating_add(pad).min(len);
        if start_idx >= end_idx {
            continue;
        }

        match ranges.last_mut() {
            Some((_, prev_end)) if start_idx <= *prev_end => *prev_end = (*prev_end).max(end_idx),
            _ => ranges.push((start_idx, end_idx)),
        }
    }

    ranges
}

/// `ranges` must be sorted and non-overlapping.
fn zero_outside(samples: &mut [f32], ranges: &[(usize, usize)]) {
    let mut cursor = 0;
    for &(start, end) in ranges {
        samples[cursor..start].fill(0.0);
        cursor = end;
    }
    samples[cursor..].fill(0.0);
}
