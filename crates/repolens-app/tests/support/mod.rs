#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use repolens_app::Session;
use repolens_core::engine::{AnalysisEngine, EngineError, EngineReply, ReplyShape};
use repolens_core::repo_ref::RepoRef;
use repolens_core::source::{FileEntry, RepositorySource, SourceError};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    ListFiles { repo: String },
    FileText { repo: String, path: String },
}

/// Scripted reply plus an optional delay before it is returned.
pub struct Scripted<T> {
    pub delay: Option<Duration>,
    pub result: T,
}

pub fn now<T>(result: T) -> Scripted<T> {
    Scripted {
        delay: None,
        result,
    }
}

pub fn after<T>(millis: u64, result: T) -> Scripted<T> {
    Scripted {
        delay: Some(Duration::from_millis(millis)),
        result,
    }
}

async fn play<T>(scripted: Scripted<T>, cancel: &CancellationToken, cancelled: T) -> T {
    match scripted.delay {
        Some(delay) => tokio::select! {
            _ = cancel.cancelled() => cancelled,
            _ = tokio::time::sleep(delay) => scripted.result,
        },
        None => scripted.result,
    }
}

#[derive(Default)]
pub struct ScriptedSource {
    listings: Mutex<VecDeque<Scripted<Result<Vec<FileEntry>, SourceError>>>>,
    files: Mutex<HashMap<String, VecDeque<Scripted<Result<String, SourceError>>>>>,
    calls: Mutex<Vec<SourceCall>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(self, listing: Scripted<Result<Vec<FileEntry>, SourceError>>) -> Self {
        self.listings.lock().expect("listings lock").push_back(listing);
        self
    }

    pub fn with_file(self, path: &str, text: Scripted<Result<String, SourceError>>) -> Self {
        self.files
            .lock()
            .expect("files lock")
            .entry(path.to_string())
            .or_default()
            .push_back(text);
        self
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl RepositorySource for ScriptedSource {
    async fn list_files(
        &self,
        repo: &RepoRef,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileEntry>, SourceError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(SourceCall::ListFiles {
                repo: repo.to_string(),
            });

        let scripted = self
            .listings
            .lock()
            .expect("listings lock")
            .pop_front()
            .unwrap_or_else(|| now(Err(SourceError::Network("missing scripted listing".into()))));
        play(scripted, cancel, Err(SourceError::Cancelled)).await
    }

    async fn file_text(
        &self,
        repo: &RepoRef,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SourceError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(SourceCall::FileText {
                repo: repo.to_string(),
                path: path.to_string(),
            });

        let scripted = self
            .files
            .lock()
            .expect("files lock")
            .get_mut(path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| now(Err(SourceError::NotFound(path.to_string()))));
        play(scripted, cancel, Err(SourceError::Cancelled)).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub shape: ReplyShape,
}

#[derive(Default)]
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<Scripted<Result<EngineReply, EngineError>>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedEngine {
    pub fn new(replies: Vec<Scripted<Result<EngineReply, EngineError>>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl AnalysisEngine for ScriptedEngine {
    async fn infer(
        &self,
        prompt: &str,
        shape: ReplyShape,
        cancel: &CancellationToken,
    ) -> Result<EngineReply, EngineError> {
        self.prompts.lock().expect("prompts lock").push(Prompt {
            text: prompt.to_string(),
            shape,
        });

        let scripted = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| now(Err(EngineError::Network("missing scripted reply".into()))));
        play(scripted, cancel, Err(EngineError::Cancelled)).await
    }
}

pub fn text(reply: &str) -> Result<EngineReply, EngineError> {
    Ok(EngineReply::Text(reply.to_string()))
}

pub fn entries(paths: &[&str]) -> Vec<FileEntry> {
    paths.iter().map(|path| FileEntry::new(*path)).collect()
}

pub fn session(
    source: &Arc<ScriptedSource>,
    engine: &Arc<ScriptedEngine>,
    timeout: Duration,
) -> Session {
    Session::new(
        Arc::clone(source) as Arc<dyn RepositorySource>,
        Arc::clone(engine) as Arc<dyn AnalysisEngine>,
        Handle::current(),
        timeout,
    )
}

pub const URL: &str = "https://github.com/octo/widgets";
