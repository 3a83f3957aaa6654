//! Gemini `generateContent` implementation of [`AnalysisEngine`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::engine::{AnalysisEngine, EngineError, EngineReply, ReplyShape, shape_reply};
use crate::http::{USER_AGENT, api_error_message, until_cancelled};

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiEngine {
    client: Client,
    api_url: Url,
    model: String,
    api_key: Option<SecretBox<String>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

impl GeminiEngine {
    pub fn new(api_url: &str, model: &str, api_key: Option<SecretBox<String>>) -> Result<Self> {
        let api_url =
            Url::parse(api_url).with_context(|| format!("invalid Gemini api url '{api_url}'"))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build Gemini http client")?;

        Ok(Self {
            client,
            api_url,
            model: model.to_string(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, api_key: &str) -> Result<Url, EngineError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                EngineError::Network(format!("api url {} cannot take a path", self.api_url))
            })?
            .pop_if_empty()
            .extend(["models", &format!("{}:generateContent", self.model)]);
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }
}

#[async_trait]
impl AnalysisEngine for GeminiEngine {
    async fn infer(
        &self,
        prompt: &str,
        shape: ReplyShape,
        cancel: &CancellationToken,
    ) -> Result<EngineReply, EngineError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EngineError::Unauthenticated("GEMINI_API_KEY is not set".to_string()))?;
        let url = self.endpoint(api_key.expose_secret())?;

        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        debug!(model = %self.model, ?shape, prompt_len = prompt.len(), "gemini request");
        let response = until_cancelled(cancel, self.client.post(url).json(&body).send())
            .await
            .ok_or(EngineError::Cancelled)?
            .map_err(|error| EngineError::Network(error.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = until_cancelled(cancel, response.text())
                .await
                .ok_or(EngineError::Cancelled)?
                .unwrap_or_default();
            let message = api_error_message(&text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    EngineError::Unauthenticated(message)
                }
                _ => EngineError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let parsed: GenerateResponse = until_cancelled(cancel, response.json())
            .await
            .ok_or(EngineError::Cancelled)?
            .map_err(|error| {
                if error.is_decode() {
                    EngineError::EmptyResponse
                } else {
                    EngineError::Network(error.without_url().to_string())
                }
            })?;

        let raw = parsed.first_text().ok_or(EngineError::EmptyResponse)?;
        shape_reply(&raw, shape)
    }
}
