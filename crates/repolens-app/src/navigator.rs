//! Selection and navigation state machine.
//!
//! Transitions are synchronous and never touch the network. Starting a
//! request hands back a [`Ticket`]; the caller runs the request and reports
//! its result through the matching `complete_*` method, which drops it
//! unless the ticket is still the current occupant of its slot.

use repolens_core::analysis::{AnalysisKind, AnalysisOutput};
use repolens_core::engine::EngineReply;
use repolens_core::repo_ref::{RepoRef, parse_repo_url};
use repolens_core::source::FileEntry;
use repolens_core::tree::build_tree;
use tracing::debug;

use crate::dispatch::{self, DispatchPlan};
use crate::error::{ErrorScope, SessionError};
use crate::slot::{SlotKind, Slots, Ticket};
use crate::state::{Download, FileContent, Phase, SessionState, SnippetExplanation};

#[derive(Debug, Clone)]
pub struct RepoLoad {
    pub ticket: Ticket,
    pub repo: RepoRef,
}

#[derive(Debug, Clone)]
pub struct FileLoad {
    pub ticket: Ticket,
    pub repo: RepoRef,
    pub entry: FileEntry,
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub ticket: Ticket,
    pub kind: AnalysisKind,
    pub plan: DispatchPlan,
}

#[derive(Debug, Clone)]
pub struct SnippetRequest {
    pub ticket: Ticket,
    pub snippet: String,
    pub plan: DispatchPlan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Failed(SessionError),
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOutcome {
    pub slot: SlotKind,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct Navigator {
    state: SessionState,
    slots: Slots,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading(SlotKind::RepoTree) {
            Phase::RepoLoading
        } else if self.state.tree.is_none() {
            Phase::Idle
        } else if self.is_loading(SlotKind::FileContent) {
            Phase::FileLoading
        } else if self.state.content.is_some() {
            Phase::FileReady
        } else {
            Phase::RepoReady
        }
    }

    pub fn is_loading(&self, slot: SlotKind) -> bool {
        self.slots.get(slot).in_flight()
    }

    pub fn loading_slots(&self) -> Vec<SlotKind> {
        self.slots.in_flight()
    }

    pub fn any_loading(&self) -> bool {
        self.slots.any_in_flight()
    }

    /// Starts loading the repository named by `url`.
    ///
    /// An unparseable url leaves the session untouched apart from the recorded
    /// repository error. A valid one cancels every slot and clears all state
    /// before the new listing is requested.
    pub fn load_repo(&mut self, url: &str) -> Result<RepoLoad, SessionError> {
        let repo = match parse_repo_url(url) {
            Ok(repo) => repo,
            Err(error) => return Err(self.reject(ErrorScope::Repository, error.into())),
        };

        self.slots.cancel_all();
        self.state = SessionState {
            repo: Some(repo.clone()),
            ..SessionState::default()
        };

        let ticket = self.slots.get_mut(SlotKind::RepoTree).begin();
        debug!(%repo, generation = ticket.generation(), "repository load started");
        Ok(RepoLoad { ticket, repo })
    }

    pub fn complete_repo_load(
        &mut self,
        ticket: &Ticket,
        result: Result<Vec<FileEntry>, SessionError>,
    ) -> Outcome {
        if !self.slots.get_mut(SlotKind::RepoTree).finish(ticket) {
            return stale(ticket);
        }

        match result {
            Ok(entries) => {
                let tree = build_tree(entries);
                debug!(
                    files = tree.file_count(),
                    folders = tree.folder_count(),
                    "repository tree ready"
                );
                self.state.tree = Some(tree);
                Outcome::Applied
            }
            Err(error) => {
                self.state.repo = None;
                self.fail(ErrorScope::Repository, error)
            }
        }
    }

    /// Selects `entry` and starts loading its text.
    ///
    /// Returns `Ok(None)` without touching anything when `entry` is already
    /// the selection.
    pub fn select_file(&mut self, entry: FileEntry) -> Result<Option<FileLoad>, SessionError> {
        if self
            .state
            .selected
            .as_ref()
            .is_some_and(|current| current.same_file(&entry))
        {
            return Ok(None);
        }

        let (Some(repo), Some(tree)) = (self.state.repo.as_ref(), self.state.tree.as_ref()) else {
            return Err(self.reject(
                ErrorScope::File,
                SessionError::invalid("no repository is loaded"),
            ));
        };
        if tree.find_file(&entry.path).is_none() {
            let message = format!("'{}' is not a file in {repo}", entry.path);
            return Err(self.reject(ErrorScope::File, SessionError::invalid(message)));
        }
        let repo = repo.clone();

        self.slots.cancel(&[
            SlotKind::FileContent,
            SlotKind::Analysis,
            SlotKind::Snippet,
        ]);
        self.state.clear_file();
        self.state.selected = Some(entry.clone());

        let ticket = self.slots.get_mut(SlotKind::FileContent).begin();
        debug!(path = %entry.path, generation = ticket.generation(), "file load started");
        Ok(Some(FileLoad {
            ticket,
            repo,
            entry,
        }))
    }

    pub fn select_path(&mut self, path: &str) -> Result<Option<FileLoad>, SessionError> {
        let entry = self
            .state
            .tree
            .as_ref()
            .and_then(|tree| tree.find_file(path))
            .cloned()
            .unwrap_or_else(|| FileEntry::new(path));
        self.select_file(entry)
    }

    pub fn complete_file_load(
        &mut self,
        ticket: &Ticket,
        result: Result<String, SessionError>,
    ) -> Outcome {
        if !self.slots.get_mut(SlotKind::FileContent).finish(ticket) {
            return stale(ticket);
        }

        match result {
            Ok(text) => {
                self.state.content = Some(FileContent::new(text));
                Outcome::Applied
            }
            Err(error) => {
                self.state.selected = None;
                self.fail(ErrorScope::File, error)
            }
        }
    }

    /// Replaces the edited text of the loaded file. Analysis results are kept.
    pub fn edit_content(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let Some(content) = self.state.content.as_mut() else {
            return Err(self.reject(
                ErrorScope::File,
                SessionError::invalid("no file content is loaded to edit"),
            ));
        };
        content.edited = text.into();
        Ok(())
    }

    pub fn request_analysis(
        &mut self,
        kind: AnalysisKind,
        question: Option<&str>,
    ) -> Result<AnalysisRequest, SessionError> {
        let (Some(entry), Some(content)) = (self.state.selected.as_ref(), self.state.content.as_ref())
        else {
            return Err(self.reject(
                ErrorScope::Analysis,
                SessionError::invalid("select a file and wait for it to load before analysing"),
            ));
        };
        let plan = dispatch::plan(kind, &entry.path, &content.edited, question);

        let ticket = self.slots.get_mut(SlotKind::Analysis).begin();
        self.state.pending_analysis = Some(kind);
        self.state.clear_error(ErrorScope::Analysis);
        debug!(%kind, generation = ticket.generation(), "analysis requested");
        Ok(AnalysisRequest { ticket, kind, plan })
    }

    pub fn complete_analysis(
        &mut self,
        ticket: &Ticket,
        kind: AnalysisKind,
        result: Result<EngineReply, SessionError>,
    ) -> Outcome {
        if !self.slots.get_mut(SlotKind::Analysis).finish(ticket) {
            return stale(ticket);
        }
        self.state.pending_analysis = None;

        let output = match result.and_then(|reply| dispatch::interpret(kind, reply)) {
            Ok(output) => output,
            Err(error) => return self.fail(ErrorScope::Analysis, error),
        };

        if kind == AnalysisKind::Comment {
            if let (AnalysisOutput::PlainText(text), Some(content)) =
                (output, self.state.content.as_mut())
            {
                content.edited = text;
            }
        } else {
            dispatch::store(&mut self.state.analysis, kind, output);
        }
        Outcome::Applied
    }

    pub fn request_snippet(&mut self, snippet: &str) -> Result<SnippetRequest, SessionError> {
        if snippet.trim().is_empty() {
            return Err(self.reject(
                ErrorScope::Snippet,
                SessionError::invalid("highlight some code to explain"),
            ));
        }
        if self.state.content.is_none() {
            return Err(self.reject(
                ErrorScope::Snippet,
                SessionError::invalid("load a file before explaining a snippet"),
            ));
        }

        let plan = dispatch::snippet_plan(snippet);
        let ticket = self.slots.get_mut(SlotKind::Snippet).begin();
        self.state.clear_error(ErrorScope::Snippet);
        Ok(SnippetRequest {
            ticket,
            snippet: snippet.to_string(),
            plan,
        })
    }

    pub fn complete_snippet(
        &mut self,
        ticket: &Ticket,
        snippet: String,
        result: Result<EngineReply, SessionError>,
    ) -> Outcome {
        if !self.slots.get_mut(SlotKind::Snippet).finish(ticket) {
            return stale(ticket);
        }

        match result {
            Ok(reply) => {
                self.state.snippet = Some(SnippetExplanation {
                    snippet,
                    explanation: dispatch::reply_text(reply),
                });
                Outcome::Applied
            }
            Err(error) => self.fail(ErrorScope::Snippet, error),
        }
    }

    /// Edited text of the selected file under its own file name.
    pub fn download(&self) -> Option<Download> {
        let entry = self.state.selected.as_ref()?;
        let content = self.state.content.as_ref()?;
        Some(Download {
            file_name: entry.file_name().to_string(),
            contents: content.edited.clone(),
        })
    }

    pub fn dismiss_error(&mut self, scope: ErrorScope) {
        self.state.clear_error(scope);
    }

    pub fn cancel_all(&mut self) {
        self.slots.cancel_all();
        self.state.pending_analysis = None;
    }

    fn reject(&mut self, scope: ErrorScope, error: SessionError) -> SessionError {
        self.state.record_error(scope, error.clone());
        error
    }

    fn fail(&mut self, scope: ErrorScope, error: SessionError) -> Outcome {
        if error.is_superseded() {
            return Outcome::Superseded;
        }
        debug!(scope = scope.label(), %error, "request failed");
        self.state.record_error(scope, error.clone());
        Outcome::Failed(error)
    }
}

fn stale(ticket: &Ticket) -> Outcome {
    debug!(
        slot = ticket.slot().label(),
        generation = ticket.generation(),
        "dropping stale completion"
    );
    Outcome::Superseded
}
