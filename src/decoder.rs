//! Decode audio files into mono `f32` at the backend's sample rate.
//!
//! Waveforms produced by the extractor are read straight through `hound`. Anything else that
//! reached the backend untouched (passthrough audio containers: mp3, flac, ogg, m4a, ...) goes
//! through Symphonia for demuxing/decoding and rubato for resampling:
//! - open the container and pick the first decodable audio track
//! - decode packets, skipping corrupt frames
//! - downmix to mono by averaging channels
//! - resample to 16 kHz when needed

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{CODEC_TYPE_NULL, CodecType, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::extract::TARGET_SAMPLE_RATE;
use crate::wav;

/// Number of source frames fed to the resampler per call.
const RESAMPLE_CHUNK_FRAMES: usize = 1024;

/// Load `path` as mono 16 kHz samples in `[-1.0, 1.0]`.
pub fn load_samples(path: &Path) -> Result<Vec<f32>> {
    if let Some(samples) = wav::read_if_normalized(path)? {
        debug!(path = %path.display(), samples = samples.len(), "read normalized waveform");
        return Ok(samples);
    }

    let (mono, src_rate) = decode_to_mono(path)?;
    let samples = resample_to_target(mono, src_rate)?;
    debug!(path = %path.display(), src_rate, samples = samples.len(), "decoded audio container");
    Ok(samples)
}

/// Whether `path` is a container holding an audio track we have an in-process decoder for.
///
/// Only the container header is read. Containers whose codec isn't built into Symphonia (Opus,
/// for instance) report `false` and have to go through the extractor instead.
pub fn is_decodable(path: &Path) -> bool {
    match open_format(path).and_then(|format| pick_audio_track(format.as_ref())) {
        Ok(track) => {
            debug!(path = %path.display(), codec = ?track.codec_params.codec, "decodable in-process");
            true
        }
        Err(err) => {
            debug!(path = %path.display(), error = %format!("{err:#}"), "not decodable in-process");
            false
        }
    }
}

/// Whether Symphonia has a decoder registered for `codec`.
fn codec_supported(codec: CodecType) -> bool {
    codec != CODEC_TYPE_NULL && symphonia::default::get_codecs().get_codec(codec).is_some()
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let mss = MediaSourceStream::new(
        Box::new(file),
        MediaSourceStreamOptions {
            // Symphonia expects a power-of-two buffer > 32KiB for good probing behavior.
            buffer_len: 256 * 1024,
        },
    );

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let opened = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| anyhow!(e))
        .context("failed to recognize media stream")?;
    Ok(opened.format)
}

/// Decode every packet of the default audio track into a single mono buffer.
fn decode_to_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut format = open_format(path)?;

    let track = pick_audio_track(format.as_ref())?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| anyhow!(e))
        .context("failed to create decoder for audio track")?;

    let mut src_rate = track.codec_params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);
    let mut mono = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            // Symphonia reports end-of-stream as an IO error.
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(anyhow!(e)).context("failed reading packet"),
        };

        if packet.track_id() != track.id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                src_rate = decoded.spec().rate;
                append_mono(decoded, &mut mono)?;
            }
            // Recoverable: corrupted frame, but decoding can continue.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(anyhow!(e)).context("decoder failure"),
        }
    }

    Ok((mono, src_rate))
}

/// First track with a supported codec and a known sample rate.
fn pick_audio_track(format: &dyn FormatReader) -> Result<Track> {
    format
        .tracks()
        .iter()
        .find(|t| codec_supported(t.codec_params.codec) && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| anyhow!("no decodable audio track found"))
}

fn append_mono(decoded: AudioBufferRef<'_>, out: &mut Vec<f32>) -> Result<()> {
    let spec = *decoded.spec();
    let channels = spec.channels.count();
    if channels == 0 {
        bail!("decoded audio had zero channels");
    }
    if decoded.frames() == 0 {
        return Ok(());
    }

    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
    buf.copy_interleaved_ref(decoded);
    downmix_into(buf.samples(), channels, out);
    Ok(())
}

/// Equal-weight average across channels.
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }

    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

/// Resample a mono buffer from `src_rate` to the target rate.
///
/// The resampler's output delay is trimmed from the front and the tail is flushed with silence,
/// so sample `i` of the output lines up with time `i / 16000` of the input.
fn resample_to_target(samples: Vec<f32>, src_rate: u32) -> Result<Vec<f32>> {
    if src_rate == TARGET_SAMPLE_RATE || samples.is_empty() {
        return Ok(samples);
    }
    if src_rate == 0 {
        bail!("decoded audio reported a sample rate of 0 Hz");
    }

    let ratio = TARGET_SAMPLE_RATE as f64 / src_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut rs = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK_FRAMES, 1)
        .map_err(|e| anyhow!(e))
        .context("failed to init resampler")?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let delay = rs.output_delay();
    let mut out = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK_FRAMES);

    let mut block = vec![0.0f32; RESAMPLE_CHUNK_FRAMES];
    for chunk in samples.chunks(RESAMPLE_CHUNK_FRAMES) {
        block[..chunk.len()].copy_from_slice(chunk);
        block[chunk.len()..].fill(0.0);
        process_block(&mut rs, &block, &mut out)?;
    }

    block.fill(0.0);
    while out.len() < expected + delay {
        process_block(&mut rs, &block, &mut out)?;
    }

    out.drain(..delay);
    out.truncate(expected);
    Ok(out)
}

fn process_block(rs: &mut SincFixedIn<f32>, block: &[f32], out: &mut Vec<f32>) -> Result<()> {
    let resampled = rs
        .process(&[block], None)
        .map_err(|e| anyhow!(e))
        .context("resampler process failed")?;

    let channel = resampled
        .first()
        .ok_or_else(|| anyhow!("expected mono output from resampler"))?;
    out.extend_from_slice(channel);
    Ok(())
}
