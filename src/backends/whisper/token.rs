use anyhow::{Context, Result};
use whisper_rs::WhisperSegment;

/// A single token with whisper's per-token timing.
#[derive(Debug, Clone)]
pub(super) struct Token {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

/// Whisper reports times in centiseconds and uses `-1` for "unknown"; clamp that to zero.
pub(super) fn centiseconds_to_seconds(value: i64) -> f64 {
    if value < 0 { 0.0 } else { value as f64 / 100.0 }
}

pub(super) fn tokens_from_segment(segment: &WhisperSegment) -> Result<Vec<Token>> {
    let token_count = segment.n_tokens();
    let token_count = usize::try_from(token_count)
        .with_context(|| format!("segment reported negative token count: {token_count}"))?;
    let mut tokens = Vec::with_capacity(token_count);

    for token_idx in 0..token_count {
        let token = segment
            .get_token(token_idx as i32)
            .context("failed to get token from segment")?;

        let data = token.token_data();
        let text = token
            .to_str()
            .with_context(|| format!("failed to get token text at index {token_idx}"))?
            .to_owned();

        tokens.push(Token {
            start_seconds: centiseconds_to_seconds(data.t0),
            end_seconds: centiseconds_to_seconds(data.t1),
            text,
        });
    }

    Ok(tokens)
}

/// Derive a segment's span from its word-level token timings.
///
/// Control tokens (`[_BEG_]`, `[_TT_50]`, ...) and tokens without timing are ignored. Returns
/// `None` when nothing usable is left, in which case the caller falls back to whisper's
/// segment-level timestamps.
pub(super) fn span_from_tokens(tokens: &[Token]) -> Option<(f64, f64)> {
    let mut span: Option<(f64, f64)> = None;

    for token in tokens {
        if token.text.starts_with("[_") && token.text.ends_with("_]") {
            continue;
        }
        if token.start_seconds <= 0.0 && token.end_seconds <= 0.0 {
            continue;
        }

        span = Some(match span {
            None => (token.start_seconds, token.end_seconds),
            Some((s, e)) => (s.min(token.start_seconds), e.max(token.end_seconds)),
        });
    }

    span.filter(|(s, e)| e >= s)
}
