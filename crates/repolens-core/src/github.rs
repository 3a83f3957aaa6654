//! GitHub REST implementation of [`RepositorySource`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::http::{USER_AGENT, api_error_message, until_cancelled};
use crate::repo_ref::RepoRef;
use crate::source::{FileEntry, RepositorySource, SourceError};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

pub struct GitHubSource {
    client: Client,
    api_url: Url,
    token: Option<SecretBox<String>>,
}

#[derive(Deserialize)]
struct RepoDetails {
    default_branch: String,
}

#[derive(Deserialize)]
struct TreeListing {
    tree: Vec<TreeListingItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeListingItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
}

impl GitHubSource {
    pub fn new(api_url: &str, token: Option<SecretBox<String>>) -> Result<Self> {
        let api_url =
            Url::parse(api_url).with_context(|| format!("invalid GitHub api url '{api_url}'"))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build GitHub http client")?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                SourceError::Malformed(format!("api url {} cannot take a path", self.api_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(
        &self,
        url: Url,
        accept: &str,
        subject: &str,
        cancel: &CancellationToken,
    ) -> Result<Response, SourceError> {
        debug!(%url, "github request");
        let mut request = self.client.get(url).header(ACCEPT, accept);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token.expose_secret()));
        }

        let response = until_cancelled(cancel, request.send())
            .await
            .ok_or(SourceError::Cancelled)?
            .map_err(|error| SourceError::Network(error.to_string()))?;

        ensure_success(response, subject, cancel).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        subject: &str,
        cancel: &CancellationToken,
    ) -> Result<T, SourceError> {
        let response = self.get(url, JSON_MEDIA_TYPE, subject, cancel).await?;
        until_cancelled(cancel, response.json::<T>())
            .await
            .ok_or(SourceError::Cancelled)?
            .map_err(|error| {
                if error.is_decode() {
                    SourceError::Malformed(format!("{subject}: {error}"))
                } else {
                    SourceError::Network(error.to_string())
                }
            })
    }
}

async fn ensure_success(
    response: Response,
    subject: &str,
    cancel: &CancellationToken,
) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound(subject.to_string()));
    }

    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "0");
    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && quota_exhausted)
    {
        return Err(SourceError::RateLimited);
    }

    let body = until_cancelled(cancel, response.text())
        .await
        .ok_or(SourceError::Cancelled)?
        .unwrap_or_default();
    Err(SourceError::Status {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

#[async_trait]
impl RepositorySource for GitHubSource {
    async fn list_files(
        &self,
        repo: &RepoRef,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileEntry>, SourceError> {
        let subject = format!("repository {repo}");
        let details_url = self.endpoint(&["repos", &repo.owner, &repo.repo_name])?;
        let details: RepoDetails = self.get_json(details_url, &subject, cancel).await?;

        let mut segments = vec![
            "repos",
            repo.owner.as_str(),
            repo.repo_name.as_str(),
            "git",
            "trees",
        ];
        segments.extend(details.default_branch.split('/'));
        let mut tree_url = self.endpoint(&segments)?;
        tree_url.query_pairs_mut().append_pair("recursive", "1");

        let listing: TreeListing = self
            .get_json(
                tree_url,
                &format!("file tree of {repo}@{}", details.default_branch),
                cancel,
            )
            .await?;

        if listing.truncated {
            warn!(repo = %repo, "file tree is truncated because the repository is too large");
        }

        Ok(listing
            .tree
            .into_iter()
            .filter(|item| item.kind == "blob")
            .map(|item| FileEntry {
                path: item.path,
                size: item.size,
            })
            .collect())
    }

    async fn file_text(
        &self,
        repo: &RepoRef,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SourceError> {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.repo_name.as_str(), "contents"];
        segments.extend(path.split('/'));
        let url = self.endpoint(&segments)?;

        let response = self
            .get(url, RAW_MEDIA_TYPE, &format!("file {path} in {repo}"), cancel)
            .await?;

        until_cancelled(cancel, response.text())
            .await
            .ok_or(SourceError::Cancelled)?
            .map_err(|error| SourceError::Network(error.to_string()))
    }
}
