/// Built-in ASR backends.
pub mod whisper;
