use std::fmt;

use thiserror::Error;
use url::Url;

/// Owner and repository name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo_name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoUrlError {
    #[error("repository url is empty")]
    Empty,
    #[error("'{input}' is not a valid url: {reason}")]
    Unparseable { input: String, reason: String },
    #[error("'{input}' does not name an owner and a repository")]
    MissingSegments { input: String },
}

pub fn parse_repo_url(input: &str) -> Result<RepoRef, RepoUrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RepoUrlError::Empty);
    }

    let url = Url::parse(trimmed).map_err(|error| RepoUrlError::Unparseable {
        input: trimmed.to_string(),
        reason: error.to_string(),
    })?;

    let mut segments = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty());

    let (Some(owner), Some(repo)) = (segments.next(), segments.next()) else {
        return Err(RepoUrlError::MissingSegments {
            input: trimmed.to_string(),
        });
    };

    let repo_name = repo.strip_suffix(".git").unwrap_or(repo);
    if repo_name.is_empty() {
        return Err(RepoUrlError::MissingSegments {
            input: trimmed.to_string(),
        });
    }

    Ok(RepoRef::new(owner, repo_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_repo_from_web_url() {
        let repo = parse_repo_url("https://github.com/d3/d3").expect("valid url");
        assert_eq!(repo, RepoRef::new("d3", "d3"));
        assert_eq!(repo.to_string(), "d3/d3");
    }

    #[test]
    fn strips_git_suffix_and_ignores_deeper_segments() {
        let repo = parse_repo_url("https://github.com/rust-lang/cargo.git/tree/master/src")
            .expect("valid url");
        assert_eq!(repo, RepoRef::new("rust-lang", "cargo"));
    }

    #[test]
    fn tolerates_trailing_and_doubled_slashes() {
        let repo = parse_repo_url("  https://github.com//tokio-rs//tokio/  ").expect("valid url");
        assert_eq!(repo, RepoRef::new("tokio-rs", "tokio"));
    }

    #[test]
    fn rejects_text_that_is_not_a_url() {
        let error = parse_repo_url("d3/d3").expect_err("relative path is not a url");
        assert!(matches!(error, RepoUrlError::Unparseable { .. }));
    }

    #[test]
    fn rejects_url_with_only_an_owner() {
        let error = parse_repo_url("https://github.com/d3").expect_err("missing repo");
        assert_eq!(
            error,
            RepoUrlError::MissingSegments {
                input: "https://github.com/d3".to_string()
            }
        );
    }

    #[test]
    fn rejects_repo_name_that_is_only_the_git_suffix() {
        let error = parse_repo_url("https://github.com/d3/.git").expect_err("empty repo");
        assert!(matches!(error, RepoUrlError::MissingSegments { .. }));
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(parse_repo_url("   "), Err(RepoUrlError::Empty));
    }
}
