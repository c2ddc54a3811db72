//! HTTP client for an Ollama server.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storyloom_core::generation::{GenerationError, SummarizationError, Summarizer, TextGenerator};
use tracing::{debug, info};

use crate::summary_prompt;

/// Talks to Ollama's non-streaming `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// Base URL, e.g. `http://localhost:11434`, without a trailing slash.
    base_url: String,
    /// Model tag, e.g. `mistral:7b-instruct`.
    model: String,
    client: Client,
}

impl OllamaClient {
    /// Creates a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest` error if the HTTP client cannot be
    /// built (for example when no TLS backend is available).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            client,
        })
    }

    /// The configured model tag.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        debug!(model = %self.model, prompt_chars = prompt.len(), "ollama request");

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else if e.is_connect() {
                    GenerationError::Unavailable(format!(
                        "cannot connect to Ollama at {}",
                        self.base_url
                    ))
                } else {
                    GenerationError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Unavailable(format!(
                "Ollama API error ({status}): {body}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::Malformed(e.to_string())
            }
        })?;
        info!(
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "ollama response received"
        );

        if body.response.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(body.response)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.complete(prompt).await
    }
}

#[async_trait]
impl Summarizer for OllamaClient {
    async fn summarize(
        &self,
        current_summary: Option<&str>,
        new_text: &str,
    ) -> Result<String, SummarizationError> {
        let prompt = summary_prompt::build(current_summary, new_text);
        let summary = self.complete(&prompt).await?;
        Ok(summary.trim().to_owned())
    }
}

/// Ollama `/api/generate` request body.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Ollama `/api/generate` response body (non-streaming).
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
