//! Run-to-completion wrappers for callers that issue one action at a time.

use repolens_core::analysis::AnalysisKind;
use repolens_core::tree::FileTree;

use crate::error::{ErrorScope, SessionError};
use crate::session::Session;
use crate::state::{FileContent, SessionState, SnippetExplanation};

impl Session {
    pub async fn open_repo(&mut self, url: &str) -> Result<&FileTree, SessionError> {
        self.load_repo(url)?;
        self.settle().await;
        settled(self.state(), ErrorScope::Repository)?;
        self.state().tree().ok_or(SessionError::Superseded)
    }

    pub async fn open_file(&mut self, path: &str) -> Result<&FileContent, SessionError> {
        self.select_path(path)?;
        self.settle().await;
        settled(self.state(), ErrorScope::File)?;
        self.state().content().ok_or(SessionError::Superseded)
    }

    pub async fn analyze(
        &mut self,
        kind: AnalysisKind,
        question: Option<&str>,
    ) -> Result<&SessionState, SessionError> {
        self.request_analysis(kind, question)?;
        self.settle().await;
        settled(self.state(), ErrorScope::Analysis)?;
        Ok(self.state())
    }

    pub async fn explain(&mut self, snippet: &str) -> Result<&SnippetExplanation, SessionError> {
        self.explain_snippet(snippet)?;
        self.settle().await;
        settled(self.state(), ErrorScope::Snippet)?;
        self.state().snippet().ok_or(SessionError::Superseded)
    }
}

fn settled(state: &SessionState, scope: ErrorScope) -> Result<(), SessionError> {
    match state.error(scope) {
        Some(error) => Err(error.clone()),
        None => Ok(()),
    }
}
