use std::sync::Once;

/// Route whisper.cpp / GGML logs into `tracing` exactly once for the lifetime of the process.
///
/// Without this, whisper.cpp prints model-loading chatter straight to stderr, interleaved with
/// our own output. With the hooks installed the messages become `tracing` events and obey the
/// `SUBTITLER_LOG` filter like everything else.
pub(super) fn init_whisper_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(whisper_rs::install_logging_hooks);
}
