use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter (e.g. `SUBTITLER_LOG=subtitler=debug`).
pub const LOG_ENV_VAR: &str = "SUBTITLER_LOG";

/// Initialize structured JSON logging on stderr.
///
/// Defaults to `error` level unless overridden by `SUBTITLER_LOG`. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(tracing::level_filters::LevelFilter::ERROR.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}
