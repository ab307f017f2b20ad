use std::path::{Path, PathBuf};

use tracing::{debug, info};
use whisper_rs::{WhisperContext, WhisperVadContext, WhisperVadContextParams};

use crate::backend::Backend;
use crate::decoder::{is_decodable, load_samples};
use crate::extract::TARGET_SAMPLE_RATE;
use crate::models::{DEFAULT_VAD_MODEL, is_published, model_path};
use crate::opts::{ComputeType, Device, ModelOpts};
use crate::segments::TranscriptionInfo;
use crate::{Error, Result};

mod ctx;
mod logging;
mod segments;
mod token;
mod vad;

pub use segments::WhisperSegments;

use segments::{detect_language, fallback_info, run_whisper_full};
use vad::mute_non_speech;

/// Built-in backend powered by `whisper-rs` / `whisper.cpp`.
///
/// Holds the loaded model (and optional VAD model) for its whole lifetime; dropping it unloads
/// both.
pub struct WhisperBackend {
    ctx: WhisperContext,
    vad_ctx: Option<WhisperVadContext>,
    model_path: PathBuf,
}

impl WhisperBackend {
    /// Load the model selected by `opts`.
    ///
    /// Fails with [`Error::ModelLoad`] when the combination can't run here (e.g. `float16` on
    /// `cpu`, or `cuda` in a build without GPU support) or when a model file is missing.
    pub fn load(opts: &ModelOpts) -> Result<Self> {
        check_combination(opts.device, opts.compute_type, cfg!(feature = "cuda"))?;

        let model_path = model_path(&opts.models_dir, opts.size, opts.compute_type);
        if !model_path.is_file() {
            return Err(Error::model_load(missing_model_message(opts, &model_path)));
        }

        let vad_path = opts.vad_path();
        if let Some(path) = &vad_path {
            if !path.is_file() {
                return Err(Error::model_load(missing_vad_message(opts, path)));
            }
        }

        info!(
            model = %model_path.display(),
            device = %opts.device,
            compute_type = %opts.compute_type,
            "loading whisper model"
        );
        let ctx = ctx::get_context(&model_path, opts.device)?;

        let vad_ctx = match &vad_path {
            Some(path) => Some(load_vad(path)?),
            None => None,
        };

        Ok(Self {
            ctx,
            vad_ctx,
            model_path,
        })
    }

    /// Access the underlying Whisper context.
    pub fn context(&self) -> &WhisperContext {
        &self.ctx
    }

    /// The model file this backend was loaded from.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl Drop for WhisperBackend {
    fn drop(&mut self) {
        debug!(model = %self.model_path.display(), "unloading whisper model");
    }
}

impl Backend for WhisperBackend {
    type Segments = WhisperSegments;

    fn reads_directly(&self, path: &Path) -> bool {
        is_decodable(path)
    }

    fn transcribe(
        &mut self,
        waveform: &Path,
        language: Option<&str>,
    ) -> Result<(WhisperSegments, TranscriptionInfo)> {
        let mut samples = load_samples(waveform).map_err(Error::transcription)?;
        info!(
            waveform = %waveform.display(),
            seconds = samples.len() as f64 / TARGET_SAMPLE_RATE as f64,
            "waveform loaded"
        );

        if samples.is_empty() {
            return Ok((WhisperSegments::empty(), fallback_info(language)));
        }

        if let Some(vad_ctx) = self.vad_ctx.as_mut() {
            let found_speech =
                mute_non_speech(vad_ctx, &mut samples).map_err(Error::transcription)?;
            if !found_speech {
                info!("no speech detected");
                return Ok((WhisperSegments::empty(), fallback_info(language)));
            }
        }

        let state =
            run_whisper_full(&self.ctx, language, &samples).map_err(Error::transcription)?;
        let info = detect_language(&state, language);

        Ok((WhisperSegments::new(state), info))
    }
}

/// Reject device/precision combinations that can't run.
fn check_combination(device: Device, compute_type: ComputeType, gpu_built: bool) -> Result<()> {
    if device == Device::Cuda && !gpu_built {
        return Err(Error::model_load(
            "device 'cuda' requested but this build has no CUDA support (rebuild with `--features cuda`)",
        ));
    }
    if device == Device::Cpu && compute_type == ComputeType::Float16 {
        return Err(Error::model_load(
            "compute type 'float16' is not supported on device 'cpu'; use 'int8' or 'float32'",
        ));
    }
    Ok(())
}

fn missing_model_message(opts: &ModelOpts, path: &Path) -> String {
    if is_published(opts.size, opts.compute_type) {
        format!(
            "model file not found at '{}'; fetch it with `model-downloader --size {} --compute-type {} --dir {}`",
            path.display(),
            opts.size,
            opts.compute_type,
            opts.models_dir.display(),
        )
    } else {
        format!(
            "model file not found at '{}'; whisper.cpp publishes no {} build of '{}', so convert one locally or pick another compute type",
            path.display(),
            opts.compute_type,
            opts.size,
        )
    }
}

fn missing_vad_message(opts: &ModelOpts, path: &Path) -> String {
    if opts.vad_model.is_some() {
        format!("VAD model not found at '{}'", path.display())
    } else {
        format!(
            "VAD model not found at '{}'; fetch it with `model-downloader --vad {DEFAULT_VAD_MODEL} --dir {}` or disable voice-activity filtering",
            path.display(),
            opts.models_dir.display(),
        )
    }
}

fn load_vad(path: &Path) -> Result<WhisperVadContext> {
    if !path.is_file() {
        return Err(Error::model_load(format!(
            "VAD model not found at '{}'",
            path.display()
        )));
    }
    let path_str = path.to_str().ok_or_else(|| {
        Error::model_load(format!("VAD model path is not valid UTF-8: {}", path.display()))
    })?;

    WhisperVadContext::new(path_str, WhisperVadContextParams::default()).map_err(|e| {
        Error::model_load(format!(
            "failed to load VAD model from '{}': {e}",
            path.display()
        ))
    })
}
