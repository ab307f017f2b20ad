//! High-level API: media file in, subtitle files out.
//!
//! One run walks through these stages:
//!
//! `Init → ModelLoading → Classifying → (Skipped | Extracting) → Transcribing → Writing → Done`
//!
//! A failure in any stage aborts the run without writing subtitle files. The backend and the
//! temporary waveform are owned by the run and released by scope, so cleanup happens on every
//! exit path, including when the failing step came before the resource was ever acquired.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::backend::Backend;
use crate::backends::whisper::WhisperBackend;
use crate::extract::{Extractor, FfmpegExtractor};
use crate::media::is_audio_container;
use crate::opts::{ModelOpts, PipelineConfig};
use crate::subtitles::{Target, write_subtitles};
use crate::waveform::{TemporaryWaveform, Waveform};
use crate::{Error, Result};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ModelLoading,
    /// Checking the input exists and deciding whether it needs extraction.
    Classifying,
    /// The input already is audio the backend reads; extraction is skipped.
    Skipped,
    Extracting,
    Transcribing,
    Writing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::ModelLoading => "model-loading",
            Stage::Classifying => "classifying",
            Stage::Skipped => "skipped",
            Stage::Extracting => "extracting",
            Stage::Transcribing => "transcribing",
            Stage::Writing => "writing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Language the backend detected (may differ from the hint).
    pub detected_language: String,
    pub language_probability: f32,
    /// Subtitle files written, in the order of [`PipelineConfig::formats`].
    pub outputs: Vec<PathBuf>,
    pub segments: usize,
}

/// Run the pipeline with ffmpeg and the built-in Whisper backend.
pub fn run(config: &PipelineConfig) -> Result<Report> {
    run_with(config, &FfmpegExtractor::default(), WhisperBackend::load)
}

/// Run the pipeline with a caller-supplied extractor and backend loader.
pub fn run_with<B, X, L>(config: &PipelineConfig, extractor: &X, load: L) -> Result<Report>
where
    B: Backend,
    X: Extractor + ?Sized,
    L: FnOnce(&ModelOpts) -> Result<B>,
{
    let mut stage = Stage::Init;
    let res = run_stages(config, extractor, load, &mut stage);
    match &res {
        Ok(report) => info!(
            outputs = report.outputs.len(),
            segments = report.segments,
            language = %report.detected_language,
            "subtitles written"
        ),
        Err(err) => error!(%stage, error = %err, "pipeline failed"),
    }
    res
}

fn run_stages<B, X, L>(
    config: &PipelineConfig,
    extractor: &X,
    load: L,
    stage: &mut Stage,
) -> Result<Report>
where
    B: Backend,
    X: Extractor + ?Sized,
    L: FnOnce(&ModelOpts) -> Result<B>,
{
    let targets = targets(config);
    if targets.is_empty() {
        return Err(Error::invalid_input("no output formats requested"));
    }

    enter(stage, Stage::ModelLoading);
    let mut engine = EngineHandle::new(load(&config.model)?);

    enter(stage, Stage::Classifying);
    if !config.input.is_file() {
        return Err(Error::invalid_input(format!(
            "input file not found: {}",
            config.input.display()
        )));
    }

    let passthrough = is_audio_container(&config.input) && {
        let readable = engine.backend.reads_directly(&config.input);
        if !readable {
            debug!(input = %config.input.display(), "audio codec not readable in-process, extracting");
        }
        readable
    };

    let waveform = if passthrough {
        enter(stage, Stage::Skipped);
        Waveform::Passthrough(config.input.clone())
    } else {
        enter(stage, Stage::Extracting);
        let tmp = TemporaryWaveform::create(config.temp_dir.as_deref())?;
        extractor.extract(&config.input, tmp.path())?;
        Waveform::Temporary(tmp)
    };

    enter(stage, Stage::Transcribing);
    let (segments, info) = engine
        .backend
        .transcribe(waveform.path(), config.language.as_deref())?;

    // Segments are produced lazily, so transcription errors can also surface from here.
    enter(stage, Stage::Writing);
    let count = write_subtitles(segments, &targets)?;

    enter(stage, Stage::Done);
    Ok(Report {
        detected_language: info.language,
        language_probability: info.language_probability,
        outputs: targets.into_iter().map(|t| t.path).collect(),
        segments: count,
    })
}

/// Requested formats in order, duplicates removed.
fn targets(config: &PipelineConfig) -> Vec<Target> {
    let mut targets: Vec<Target> = Vec::with_capacity(config.formats.len());
    for &output_type in &config.formats {
        if targets.iter().all(|t| t.output_type != output_type) {
            targets.push(Target::new(output_type, config.output_path(output_type)));
        }
    }
    targets
}

fn enter(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "pipeline stage");
    *stage = next;
}

/// Owns the loaded backend for one run and releases it when the run ends.
struct EngineHandle<B> {
    backend: B,
}

impl<B> EngineHandle<B> {
    fn new(backend: B) -> Self {
        debug!("engine loaded");
        Self { backend }
    }
}

impl<B> Drop for EngineHandle<B> {
    fn drop(&mut self) {
        debug!("releasing engine");
    }
}
