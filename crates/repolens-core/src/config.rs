use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use secrecy::SecretBox;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::gemini::{DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL};
use crate::github::DEFAULT_GITHUB_API_URL;

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepolensConfig {
    pub version: u32,
    pub github: GitHubConfig,
    pub gemini: GeminiConfig,
    pub requests: RequestsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeminiConfig {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestsConfig {
    pub timeout_secs: u64,
}

impl Default for RepolensConfig {
    fn default() -> Self {
        Self {
            version: 1,
            github: GitHubConfig::default(),
            gemini: GeminiConfig::default(),
            requests: RequestsConfig::default(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            token: None,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RepolensConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.requests.timeout_secs)
    }

    /// Applies `GITHUB_TOKEN` / `GEMINI_API_KEY` on top of file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(non_empty_env(GITHUB_TOKEN_ENV), non_empty_env(GEMINI_API_KEY_ENV))
    }

    pub fn with_overrides(
        mut self,
        github_token: Option<String>,
        gemini_key: Option<String>,
    ) -> Self {
        if github_token.is_some() {
            self.github.token = github_token;
        }
        if gemini_key.is_some() {
            self.gemini.api_key = gemini_key;
        }
        self
    }

    pub fn github_token(&self) -> Option<SecretBox<String>> {
        secret(self.github.token.as_deref())
    }

    pub fn gemini_api_key(&self) -> Option<SecretBox<String>> {
        secret(self.gemini.api_key.as_deref())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub fn resolve_config_dir() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs.home_dir().join(".config").join("repolens"))
}

pub fn resolve_config_path() -> Result<PathBuf, ConfigError> {
    Ok(resolve_config_dir()?.join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<RepolensConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: RepolensConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

/// Loads the config file when it exists and falls back to defaults otherwise.
pub fn load_config_or_default(path: &Path) -> Result<RepolensConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(RepolensConfig::default())
    }
}

pub fn validate_config(config: &RepolensConfig) -> Result<(), ConfigError> {
    if config.version != 1 {
        return Err(validation("version must be 1"));
    }

    validate_api_url("github.api_url", &config.github.api_url)?;
    validate_api_url("gemini.api_url", &config.gemini.api_url)?;

    if config.gemini.model.trim().is_empty() {
        return Err(validation("gemini.model must be non-empty"));
    }

    if !(1..=MAX_TIMEOUT_SECS).contains(&config.requests.timeout_secs) {
        return Err(validation(format!(
            "requests.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
        )));
    }

    Ok(())
}

fn validate_api_url(field: &str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        Ok(url) => Err(validation(format!(
            "{field} must be an http(s) url, got scheme '{}'",
            url.scheme()
        ))),
        Err(error) => Err(validation(format!("{field} is not a valid url: {error}"))),
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

fn secret(value: Option<&str>) -> Option<SecretBox<String>> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| SecretBox::new(Box::new(value.to_string())))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
