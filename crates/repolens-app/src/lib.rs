pub mod dispatch;
pub mod error;
mod flow;
pub mod navigator;
pub mod session;
pub mod slot;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use repolens_core::config::{RepolensConfig, load_config_or_default, resolve_config_path};
use repolens_core::engine::AnalysisEngine;
use repolens_core::gemini::GeminiEngine;
use repolens_core::github::GitHubSource;
use repolens_core::source::RepositorySource;
use tokio::runtime::Handle;

pub use error::{ErrorScope, SessionError};
pub use navigator::{Navigator, Outcome, SlotOutcome};
pub use session::Session;
pub use slot::SlotKind;
pub use state::{Download, FileContent, Phase, SessionState, SnippetExplanation};

pub struct App {
    config: RepolensConfig,
}

impl App {
    pub fn new(config: RepolensConfig) -> Self {
        Self { config }
    }

    /// Reads `~/.config/repolens/config.toml` (defaults when absent) and
    /// applies the secret environment overrides.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ensure_config_ready()?))
    }

    pub fn config(&self) -> &RepolensConfig {
        &self.config
    }

    pub fn session(&self, runtime: Handle) -> Result<Session> {
        let source = GitHubSource::new(&self.config.github.api_url, self.config.github_token())
            .context("failed to set up the GitHub source")?;
        let engine = GeminiEngine::new(
            &self.config.gemini.api_url,
            &self.config.gemini.model,
            self.config.gemini_api_key(),
        )
        .context("failed to set up the Gemini engine")?;

        Ok(self.session_with(Arc::new(source), Arc::new(engine), runtime))
    }

    pub fn session_with(
        &self,
        source: Arc<dyn RepositorySource>,
        engine: Arc<dyn AnalysisEngine>,
        runtime: Handle,
    ) -> Session {
        Session::new(source, engine, runtime, self.config.request_timeout())
    }
}

pub fn ensure_config_ready() -> Result<RepolensConfig> {
    let config_path = resolve_config_path().context("failed to resolve config path")?;

    let config = load_config_or_default(&config_path).map_err(|error| {
        anyhow!(
            "{error}\nFix {} or remove it to use defaults.",
            config_path.display()
        )
    })?;

    Ok(config.with_env_overrides())
}
