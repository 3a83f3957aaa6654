pub mod cli;
pub mod diagnostics;
pub mod dispatch;
pub mod logging;
pub mod render;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::diagnostics::DiagnosticsSession;

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics)?;
    if let Some(path) = diagnostics.path() {
        eprintln!("Diagnostics enabled: {}", path.display());
    }
    let interactive = matches!(cli.command, Command::Browse { .. });
    logging::init_tracing(&diagnostics, interactive)?;
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        command = ?cli.command,
        "repolens starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    dispatch::run_with_deps(cli, &runtime)
}
