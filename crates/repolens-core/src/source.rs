use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::repo_ref::RepoRef;

/// A file (blob) listed by a repository source. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    pub path: String,
    pub size: Option<u64>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Last path segment, used as the download file name.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Extension of the last path segment, lowercased.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn same_file(&self, other: &FileEntry) -> bool {
        self.path == other.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited by the repository host; retry later or configure a token")]
    RateLimited,
    #[error("network failure: {0}")]
    Network(String),
    #[error("repository host returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response payload: {0}")]
    Malformed(String),
    #[error("request was cancelled")]
    Cancelled,
}

/// Remote listing and raw file access for a named repository.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn list_files(
        &self,
        repo: &RepoRef,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileEntry>, SourceError>;

    async fn file_text(
        &self,
        repo: &RepoRef,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SourceError>;
}
