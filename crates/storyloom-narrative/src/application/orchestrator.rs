//! The turn orchestrator and its configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use storyloom_core::clock::Clock;
use storyloom_core::generation::{GenerationError, Summarizer, TextGenerator};
use storyloom_core::repository::StoryRepository;
use tracing::warn;

use super::locks::StoryLocks;
use crate::domain::context::DEFAULT_CONTEXT_WINDOW;
use crate::domain::summarization::{DEFAULT_SUMMARY_INTERVAL, SummarizationScheduler};
use crate::domain::turn;

/// Tunables of the turn engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Summarize every this many retained nodes.
    pub summary_interval: usize,
    /// Recent nodes kept next to a summary in the context window.
    pub context_window: usize,
    /// Upper bound on one generator or summarizer call.
    pub generation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            summary_interval: DEFAULT_SUMMARY_INTERVAL,
            context_window: DEFAULT_CONTEXT_WINDOW,
            generation_timeout: Duration::from_secs(60),
        }
    }
}

/// Coordinates rewinds, context selection, generation, persistence and
/// summarization. All collaborators are supplied at construction.
///
/// Cloning is cheap and clones share the same per-story locks.
#[derive(Clone)]
pub struct TurnOrchestrator {
    pub(crate) repository: Arc<dyn StoryRepository>,
    pub(crate) generator: Arc<dyn TextGenerator>,
    pub(crate) summarizer: Arc<dyn Summarizer>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) locks: StoryLocks,
    pub(crate) config: EngineConfig,
}

impl TurnOrchestrator {
    /// Wires an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        repository: Arc<dyn StoryRepository>,
        generator: Arc<dyn TextGenerator>,
        summarizer: Arc<dyn Summarizer>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repository,
            generator,
            summarizer,
            clock,
            locks: StoryLocks::new(),
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub(crate) fn scheduler(&self) -> SummarizationScheduler {
        SummarizationScheduler::new(self.config.summary_interval)
    }

    /// Calls the generator and parses its output. Any failure, timeout or
    /// blank answer is replaced by `fallback`, so this always yields at
    /// least one paragraph.
    pub(crate) async fn generate_paragraphs(
        &self,
        prompt: &str,
        fallback: impl FnOnce() -> String,
    ) -> Vec<String> {
        let outcome =
            match tokio::time::timeout(self.config.generation_timeout, self.generator.generate(prompt))
                .await
            {
                Ok(Ok(raw)) => {
                    let paragraphs = turn::parse_paragraphs(&raw);
                    if paragraphs.is_empty() {
                        Err(GenerationError::Empty)
                    } else {
                        Ok(paragraphs)
                    }
                }
                Ok(Err(err)) => Err(err),
                Err(_) => Err(GenerationError::Timeout),
            };

        match outcome {
            Ok(paragraphs) => paragraphs,
            Err(err) => {
                warn!(error = %err, "text generation failed, substituting fallback");
                turn::parse_paragraphs(&fallback())
            }
        }
    }
}

impl fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("locks", &self.locks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
