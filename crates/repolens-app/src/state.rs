use std::collections::BTreeMap;

use repolens_core::analysis::{AnalysisKind, AnalysisResults};
use repolens_core::repo_ref::RepoRef;
use repolens_core::source::FileEntry;
use repolens_core::tree::FileTree;

use crate::error::{ErrorScope, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    RepoLoading,
    RepoReady,
    FileLoading,
    FileReady,
}

/// Text of the selected file: what the source returned and the user's edit of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub original: String,
    pub edited: String,
}

impl FileContent {
    pub fn new(text: String) -> Self {
        Self {
            edited: text.clone(),
            original: text,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.original != self.edited
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetExplanation {
    pub snippet: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub contents: String,
}

/// Everything the presentation layer renders for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) repo: Option<RepoRef>,
    pub(crate) tree: Option<FileTree>,
    pub(crate) selected: Option<FileEntry>,
    pub(crate) content: Option<FileContent>,
    pub(crate) analysis: AnalysisResults,
    pub(crate) pending_analysis: Option<AnalysisKind>,
    pub(crate) snippet: Option<SnippetExplanation>,
    pub(crate) errors: BTreeMap<ErrorScope, SessionError>,
}

impl SessionState {
    pub fn repo(&self) -> Option<&RepoRef> {
        self.repo.as_ref()
    }

    pub fn tree(&self) -> Option<&FileTree> {
        self.tree.as_ref()
    }

    pub fn selected(&self) -> Option<&FileEntry> {
        self.selected.as_ref()
    }

    pub fn content(&self) -> Option<&FileContent> {
        self.content.as_ref()
    }

    pub fn analysis(&self) -> &AnalysisResults {
        &self.analysis
    }

    /// Kind of the analysis request currently in flight.
    pub fn pending_analysis(&self) -> Option<AnalysisKind> {
        self.pending_analysis
    }

    pub fn snippet(&self) -> Option<&SnippetExplanation> {
        self.snippet.as_ref()
    }

    pub fn error(&self, scope: ErrorScope) -> Option<&SessionError> {
        self.errors.get(&scope)
    }

    pub fn errors(&self) -> impl Iterator<Item = (ErrorScope, &SessionError)> {
        self.errors.iter().map(|(scope, error)| (*scope, error))
    }

    pub(crate) fn record_error(&mut self, scope: ErrorScope, error: SessionError) {
        if error.is_superseded() {
            return;
        }
        self.errors.insert(scope, error);
    }

    pub(crate) fn clear_error(&mut self, scope: ErrorScope) {
        self.errors.remove(&scope);
    }

    /// Drops everything derived from the current selection.
    pub(crate) fn clear_file(&mut self) {
        self.content = None;
        self.analysis = AnalysisResults::default();
        self.pending_analysis = None;
        self.snippet = None;
        for scope in [ErrorScope::File, ErrorScope::Analysis, ErrorScope::Snippet] {
            self.clear_error(scope);
        }
    }
}
