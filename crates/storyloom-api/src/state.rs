//! Shared application state.

use storyloom_narrative::application::orchestrator::TurnOrchestrator;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The turn engine. Clones share per-story locks.
    pub engine: TurnOrchestrator,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(engine: TurnOrchestrator) -> Self {
        Self { engine }
    }
}
