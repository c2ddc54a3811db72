//! Test generators and summarizers.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use storyloom_core::generation::{GenerationError, SummarizationError, Summarizer, TextGenerator};

/// A generator that replays a script of responses and records every prompt
/// it receives. Once the script runs out, the last response is repeated.
#[derive(Debug)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Create a generator that answers with `responses` in order.
    #[must_use]
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            last: Mutex::new(String::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a generator that always answers with `response`.
    #[must_use]
    pub fn repeating(response: impl Into<String>) -> Self {
        Self::new([response.into()])
    }

    /// Returns every prompt received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

/// A generator that always fails as if the service were down.
#[derive(Debug)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable("connection refused".into()))
    }
}

/// A generator that sleeps before answering. Pair it with a short engine
/// timeout to exercise the timeout path.
#[derive(Debug)]
pub struct StallingGenerator {
    /// How long to stall.
    pub delay: Duration,
    /// What to answer if the caller waits long enough.
    pub response: String,
}

#[async_trait]
impl TextGenerator for StallingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }
}

/// A summarizer that records its inputs and answers `"summary #<n>"` for
/// the n-th call.
#[derive(Debug, Default)]
pub struct RecordingSummarizer {
    calls: Mutex<Vec<(Option<String>, String)>>,
}

impl RecordingSummarizer {
    /// Create a summarizer with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(current_summary, new_text)` for every call so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<(Option<String>, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(
        &self,
        current_summary: Option<&str>,
        new_text: &str,
    ) -> Result<String, SummarizationError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((current_summary.map(str::to_owned), new_text.to_owned()));
        Ok(format!("summary #{}", calls.len()))
    }
}

/// A summarizer that always fails.
#[derive(Debug)]
pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(
        &self,
        _current_summary: Option<&str>,
        _new_text: &str,
    ) -> Result<String, SummarizationError> {
        Err(SummarizationError("model overloaded".into()))
    }
}

/// A summarizer that sleeps before answering with a fixed summary.
#[derive(Debug)]
pub struct StallingSummarizer {
    /// How long to stall.
    pub delay: Duration,
    /// What to answer if the caller waits long enough.
    pub response: String,
}

#[async_trait]
impl Summarizer for StallingSummarizer {
    async fn summarize(
        &self,
        _current_summary: Option<&str>,
        _new_text: &str,
    ) -> Result<String, SummarizationError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }
}
