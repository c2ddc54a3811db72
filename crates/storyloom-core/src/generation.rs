//! Text generation and summarization collaborators.
//!
//! Both services are opaque to the engine; only their call contracts
//! matter. Their errors are absorbed by the turn engine and never surface
//! to callers.

use async_trait::async_trait;
use thiserror::Error;

/// Failure of the external text generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service could not be reached or answered with an error status.
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time.
    #[error("generator timed out")]
    Timeout,

    /// The service answered but produced no usable text.
    #[error("generator returned an empty response")]
    Empty,

    /// The response could not be decoded.
    #[error("malformed generator response: {0}")]
    Malformed(String),
}

/// Failure of the external summarizer.
#[derive(Debug, Error)]
#[error("summarization failed: {0}")]
pub struct SummarizationError(pub String);

impl From<GenerationError> for SummarizationError {
    fn from(err: GenerationError) -> Self {
        Self(err.to_string())
    }
}

/// Produces narrative text for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a continuation for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Compresses narrative history into a running digest.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Fold `new_text` into `current_summary` and return the new summary.
    async fn summarize(
        &self,
        current_summary: Option<&str>,
        new_text: &str,
    ) -> Result<String, SummarizationError>;
}
