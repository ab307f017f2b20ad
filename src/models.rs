//! whisper.cpp model file naming.
//!
//! A `(size, compute type)` pair maps to one GGML file: int8 uses the `q8_0` quantization,
//! float16 is the stock release, float32 a locally converted full-precision file.

use std::path::{Path, PathBuf};

use crate::opts::{ComputeType, ModelSize};

/// Hugging Face repository that hosts the stock whisper.cpp GGML files.
pub const WHISPER_MODELS_BASE_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Hugging Face repository that hosts whisper.cpp's Silero VAD models.
pub const VAD_MODELS_BASE_URL: &str = "https://huggingface.co/ggml-org/whisper-vad/resolve/main";

/// Silero VAD versions we know how to fetch.
pub const VAD_MODEL_NAMES: &[&str] = &["silero-v5.1.2", "silero-v6.2.0"];

/// VAD model used when none is configured explicitly.
pub const DEFAULT_VAD_MODEL: &str = "silero-v6.2.0";

/// Sizes with a published `q8_0` quantization. `large-v3` only ships as `q5_0` and full
/// precision.
static PUBLISHED_INT8: &[ModelSize] = &[
    ModelSize::Tiny,
    ModelSize::Small,
    ModelSize::Medium,
    ModelSize::LargeV2,
];

/// File name of the whisper model for `size` at `compute_type`.
pub fn model_file_name(size: ModelSize, compute_type: ComputeType) -> String {
    let suffix = match compute_type {
        ComputeType::Int8 => "-q8_0",
        ComputeType::Float16 => "",
        ComputeType::Float32 => "-f32",
    };
    format!("ggml-{}{suffix}.bin", size.as_str())
}

/// Full path of the whisper model inside `models_dir`.
pub fn model_path(models_dir: &Path, size: ModelSize, compute_type: ComputeType) -> PathBuf {
    models_dir.join(model_file_name(size, compute_type))
}

/// Whether whisper.cpp publishes a file for `size` at `compute_type`.
///
/// Full-precision (`float32`) files aren't distributed at all; users convert them locally.
pub fn is_published(size: ModelSize, compute_type: ComputeType) -> bool {
    match compute_type {
        ComputeType::Int8 => PUBLISHED_INT8.contains(&size),
        ComputeType::Float16 => true,
        ComputeType::Float32 => false,
    }
}

/// Download URL for a whisper model, if one is published.
pub fn model_url(size: ModelSize, compute_type: ComputeType) -> Option<String> {
    is_published(size, compute_type).then(|| {
        format!(
            "{WHISPER_MODELS_BASE_URL}/{}",
            model_file_name(size, compute_type)
        )
    })
}

/// File name of a Silero VAD model (e.g. `silero-v6.2.0` → `ggml-silero-v6.2.0.bin`).
pub fn vad_file_name(name: &str) -> String {
    format!("ggml-{name}.bin")
}

/// Where the default VAD model lives inside `models_dir`.
pub fn default_vad_path(models_dir: &Path) -> PathBuf {
    models_dir.join(vad_file_name(DEFAULT_VAD_MODEL))
}
