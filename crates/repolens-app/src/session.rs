//! Async driver around [`Navigator`].
//!
//! Each issued request runs as its own task on the runtime. The task races
//! the ticket's cancellation token and the request timeout, then always
//! reports back over a channel; the session applies reports in arrival order.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use repolens_core::analysis::AnalysisKind;
use repolens_core::engine::{AnalysisEngine, EngineReply};
use repolens_core::source::{FileEntry, RepositorySource};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{ErrorScope, SessionError};
use crate::navigator::{AnalysisRequest, FileLoad, Navigator, RepoLoad, SlotOutcome, SnippetRequest};
use crate::slot::{SlotKind, Ticket};
use crate::state::{Download, Phase, SessionState};

enum Completion {
    RepoTree {
        ticket: Ticket,
        result: Result<Vec<FileEntry>, SessionError>,
    },
    FileContent {
        ticket: Ticket,
        result: Result<String, SessionError>,
    },
    Analysis {
        ticket: Ticket,
        kind: AnalysisKind,
        result: Result<EngineReply, SessionError>,
    },
    Snippet {
        ticket: Ticket,
        snippet: String,
        result: Result<EngineReply, SessionError>,
    },
}

pub struct Session {
    navigator: Navigator,
    source: Arc<dyn RepositorySource>,
    engine: Arc<dyn AnalysisEngine>,
    runtime: Handle,
    timeout: Duration,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl Session {
    pub fn new(
        source: Arc<dyn RepositorySource>,
        engine: Arc<dyn AnalysisEngine>,
        runtime: Handle,
        timeout: Duration,
    ) -> Self {
        let (completions_tx, completions_rx) = unbounded_channel();
        Self {
            navigator: Navigator::new(),
            source,
            engine,
            runtime,
            timeout,
            completions_tx,
            completions_rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.navigator.state()
    }

    pub fn phase(&self) -> Phase {
        self.navigator.phase()
    }

    pub fn is_loading(&self, slot: SlotKind) -> bool {
        self.navigator.is_loading(slot)
    }

    pub fn loading_slots(&self) -> Vec<SlotKind> {
        self.navigator.loading_slots()
    }

    pub fn any_loading(&self) -> bool {
        self.navigator.any_loading()
    }

    pub fn load_repo(&mut self, url: &str) -> Result<(), SessionError> {
        let RepoLoad { ticket, repo } = self.navigator.load_repo(url)?;
        let source = Arc::clone(&self.source);
        let cancel = ticket.cancel_token().clone();

        self.spawn(
            ticket.cancel_token().clone(),
            ticket.slot(),
            async move {
                source
                    .list_files(&repo, &cancel)
                    .await
                    .map_err(SessionError::from)
            },
            move |result| Completion::RepoTree { ticket, result },
        );
        Ok(())
    }

    /// Returns whether a new file request was issued.
    pub fn select_file(&mut self, entry: FileEntry) -> Result<bool, SessionError> {
        let load = self.navigator.select_file(entry)?;
        Ok(self.spawn_file_load(load))
    }

    pub fn select_path(&mut self, path: &str) -> Result<bool, SessionError> {
        let load = self.navigator.select_path(path)?;
        Ok(self.spawn_file_load(load))
    }

    pub fn edit_content(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.navigator.edit_content(text)
    }

    pub fn request_analysis(
        &mut self,
        kind: AnalysisKind,
        question: Option<&str>,
    ) -> Result<(), SessionError> {
        let AnalysisRequest { ticket, kind, plan } =
            self.navigator.request_analysis(kind, question)?;
        let engine = Arc::clone(&self.engine);
        let cancel = ticket.cancel_token().clone();

        self.spawn(
            ticket.cancel_token().clone(),
            ticket.slot(),
            async move {
                engine
                    .infer(&plan.prompt, plan.shape, &cancel)
                    .await
                    .map_err(SessionError::from)
            },
            move |result| Completion::Analysis {
                ticket,
                kind,
                result,
            },
        );
        Ok(())
    }

    pub fn explain_snippet(&mut self, snippet: &str) -> Result<(), SessionError> {
        let SnippetRequest {
            ticket,
            snippet,
            plan,
        } = self.navigator.request_snippet(snippet)?;
        let engine = Arc::clone(&self.engine);
        let cancel = ticket.cancel_token().clone();

        self.spawn(
            ticket.cancel_token().clone(),
            ticket.slot(),
            async move {
                engine
                    .infer(&plan.prompt, plan.shape, &cancel)
                    .await
                    .map_err(SessionError::from)
            },
            move |result| Completion::Snippet {
                ticket,
                snippet,
                result,
            },
        );
        Ok(())
    }

    pub fn download(&self) -> Option<Download> {
        self.navigator.download()
    }

    pub fn dismiss_error(&mut self, scope: ErrorScope) {
        self.navigator.dismiss_error(scope);
    }

    /// Cancels every in-flight request. Their reports are dropped as stale.
    pub fn cancel_all(&mut self) {
        self.navigator.cancel_all();
    }

    /// Applies every report that has already arrived, without waiting.
    pub fn drain(&mut self) -> Vec<SlotOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            outcomes.push(self.apply(completion));
        }
        outcomes
    }

    /// Waits for the next report while any slot is in flight.
    ///
    /// Returns `None` once nothing is in flight and no report is queued.
    pub async fn next_outcome(&mut self) -> Option<SlotOutcome> {
        if let Ok(completion) = self.completions_rx.try_recv() {
            return Some(self.apply(completion));
        }
        if !self.navigator.any_loading() {
            return None;
        }

        let completion = self.completions_rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Applies reports until no slot is in flight.
    pub async fn settle(&mut self) -> Vec<SlotOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_outcome().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    fn spawn_file_load(&mut self, load: Option<FileLoad>) -> bool {
        let Some(FileLoad {
            ticket,
            repo,
            entry,
        }) = load
        else {
            return false;
        };
        let source = Arc::clone(&self.source);
        let cancel = ticket.cancel_token().clone();

        self.spawn(
            ticket.cancel_token().clone(),
            ticket.slot(),
            async move {
                source
                    .file_text(&repo, &entry.path, &cancel)
                    .await
                    .map_err(SessionError::from)
            },
            move |result| Completion::FileContent { ticket, result },
        );
        true
    }

    fn spawn<T, F, R>(&self, cancel: CancellationToken, slot: SlotKind, work: F, report: R)
    where
        T: Send + 'static,
        F: Future<Output = Result<T, SessionError>> + Send + 'static,
        R: FnOnce(Result<T, SessionError>) -> Completion + Send + 'static,
    {
        let limit = self.timeout;
        let completions_tx = self.completions_tx.clone();

        self.runtime.spawn(async move {
            let guarded = AssertUnwindSafe(work).catch_unwind();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(SessionError::Superseded),
                finished = tokio::time::timeout(limit, guarded) => match finished {
                    Ok(Ok(result)) => result,
                    Ok(Err(_)) => {
                        error!(slot = slot.label(), "request task panicked");
                        Err(SessionError::SourceUnavailable(format!(
                            "{} request failed unexpectedly",
                            slot.label()
                        )))
                    }
                    Err(_) => Err(SessionError::timed_out(limit)),
                },
            };

            if completions_tx.send(report(result)).is_err() {
                debug!(slot = slot.label(), "session closed before request finished");
            }
        });
    }

    fn apply(&mut self, completion: Completion) -> SlotOutcome {
        let (slot, outcome) = match completion {
            Completion::RepoTree { ticket, result } => (
                ticket.slot(),
                self.navigator.complete_repo_load(&ticket, result),
            ),
            Completion::FileContent { ticket, result } => (
                ticket.slot(),
                self.navigator.complete_file_load(&ticket, result),
            ),
            Completion::Analysis {
                ticket,
                kind,
                result,
            } => (
                ticket.slot(),
                self.navigator.complete_analysis(&ticket, kind, result),
            ),
            Completion::Snippet {
                ticket,
                snippet,
                result,
            } => (
                ticket.slot(),
                self.navigator.complete_snippet(&ticket, snippet, result),
            ),
        };
        SlotOutcome { slot, outcome }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.navigator.cancel_all();
    }
}
