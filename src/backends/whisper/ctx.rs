use std::path::Path;

use whisper_rs::{WhisperContext, WhisperContextParameters};

use super::logging::init_whisper_logging;
use crate::opts::Device;
use crate::{Error, Result};

/// Load a Whisper model onto `device` and return an initialized `WhisperContext`.
pub(super) fn get_context(model_path: &Path, device: Device) -> Result<WhisperContext> {
    init_whisper_logging();

    let path = model_path.to_str().ok_or_else(|| {
        Error::model_load(format!(
            "model path is not valid UTF-8: {}",
            model_path.display()
        ))
    })?;

    let mut ctx_params = WhisperContextParameters::default();
    ctx_params.use_gpu(device == Device::Cuda);

    WhisperContext::new_with_params(path, ctx_params)
        .map_err(|e| Error::model_load(format!("failed to load model from path: {path}: {e}")))
}
