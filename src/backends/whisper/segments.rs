use anyhow::{Context, Result};
use tracing::warn;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperSegment, WhisperState};

use super::token::{centiseconds_to_seconds, span_from_tokens, tokens_from_segment};
use crate::segments::{Segment, TranscriptionInfo};

/// Language code reported when nothing better is known (“undetermined”).
pub(super) const UNDETERMINED_LANGUAGE: &str = "und";

/// Lazy iterator over the segments of a finished whisper run.
///
/// Segments are converted one at a time as the caller pulls them; the state is dropped with
/// the iterator.
pub struct WhisperSegments {
    state: Option<WhisperState>,
    next: i32,
}

impl WhisperSegments {
    pub(super) fn new(state: WhisperState) -> Self {
        Self {
            state: Some(state),
            next: 0,
        }
    }

    /// A sequence that yields nothing (no audio, or no speech found).
    pub(super) fn empty() -> Self {
        Self {
            state: None,
            next: 0,
        }
    }
}

impl Iterator for WhisperSegments {
    type Item = crate::Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.state.as_ref()?;
        let segment = state.get_segment(self.next)?;
        self.next += 1;
        Some(to_segment(segment).map_err(crate::Error::transcription))
    }
}

pub(super) fn to_segment(segment: WhisperSegment) -> Result<Segment> {
    let text = segment
        .to_str()
        .context("failed to get segment text")?
        .to_owned();

    let tokens = tokens_from_segment(&segment)?;

    // Prefer token-derived timing so segments don't include leading/trailing silence.
    let (start_seconds, end_seconds) = span_from_tokens(&tokens).unwrap_or_else(|| {
        (
            centiseconds_to_seconds(segment.start_timestamp()),
            centiseconds_to_seconds(segment.end_timestamp()),
        )
    });

    Ok(Segment {
        start_seconds,
        end_seconds: end_seconds.max(start_seconds),
        text,
    })
}

fn build_full_params(language: Option<&str>) -> FullParams<'_, '_> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: 1.0,
    });

    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(false);
    params.set_language(language);
    params.set_no_context(true);
    params.set_single_segment(false);

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params.set_token_timestamps(true);

    params
}

pub(super) fn run_whisper_full(
    ctx: &WhisperContext,
    language: Option<&str>,
    samples: &[f32],
) -> Result<WhisperState> {
    let params = build_full_params(language);

    let mut state = ctx
        .create_state()
        .context("failed to create whisper state")?;

    state
        .full(params, samples)
        .context("failed to run whisper full()")?;

    Ok(state)
}

/// Ask whisper's language detector what it heard.
///
/// This is best-effort reporting: if detection fails we log it and fall back to the hint (or
/// `und`) with zero confidence rather than failing a transcription that already succeeded.
pub(super) fn detect_language(state: &WhisperState, hint: Option<&str>) -> TranscriptionInfo {
    let detected = state
        .lang_detect(0, num_cpus::get())
        .context("language detection failed")
        .and_then(|(lang_id, probs)| {
            let language = whisper_rs::get_lang_str(lang_id)
                .with_context(|| format!("unknown language id {lang_id}"))?;
            let probability = usize::try_from(lang_id)
                .ok()
                .and_then(|idx| probs.get(idx).copied())
                .unwrap_or(0.0);
            Ok((language.to_owned(), probability))
        });

    match detected {
        Ok((language, language_probability)) => TranscriptionInfo {
            language,
            language_probability,
        },
        Err(err) => {
            warn!(error = %format!("{err:#}"), "could not determine spoken language");
            fallback_info(hint)
        }
    }
}

pub(super) fn fallback_info(hint: Option<&str>) -> TranscriptionInfo {
    TranscriptionInfo {
        language: hint.unwrap_or(UNDETERMINED_LANGUAGE).to_owned(),
        language_probability: 0.0,
    }
}
