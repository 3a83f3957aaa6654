use anyhow::{Result, anyhow};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::diagnostics::{DiagnosticsSession, DiagnosticsWriter};

/// Installs the global tracing subscriber.
///
/// With diagnostics on, everything at `debug` and above goes to the log file.
/// Otherwise one-shot commands log to stderr at `warn`, and the interactive
/// browser logs nowhere so the terminal stays intact.
pub fn init_tracing(diagnostics: &DiagnosticsSession, interactive: bool) -> Result<()> {
    let default_level = if diagnostics.enabled() {
        "debug"
    } else {
        "warn"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let layer = if diagnostics.enabled() {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(|| DiagnosticsWriter)
            .with_filter(env_filter)
            .boxed()
    } else if interactive {
        return Ok(());
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
