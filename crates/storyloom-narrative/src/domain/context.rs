//! Context window selection.
//!
//! Decides which part of the retained history feeds the next prompt. The
//! caller passes only retained nodes, so pruned nodes can never leak in.

use storyloom_core::story::{Story, StoryNode};

/// Number of recent nodes kept verbatim next to a summary.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// The history handed to the prompt assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextWindow<'a> {
    /// Every retained node, oldest first.
    FullHistory(&'a [StoryNode]),
    /// The running summary plus the most recent nodes, oldest first.
    SummaryWindow {
        /// Digest of earlier history.
        summary: &'a str,
        /// The most recent nodes.
        recent: &'a [StoryNode],
    },
}

impl<'a> ContextWindow<'a> {
    /// The raw nodes included in this window.
    #[must_use]
    pub fn nodes(&self) -> &'a [StoryNode] {
        match *self {
            Self::FullHistory(nodes) => nodes,
            Self::SummaryWindow { recent, .. } => recent,
        }
    }
}

/// Picks full history while the story has no summary, and summary plus the
/// last `window` nodes once it does.
#[must_use]
pub fn select<'a>(story: &'a Story, retained: &'a [StoryNode], window: usize) -> ContextWindow<'a> {
    match story.non_empty_summary() {
        Some(summary) => {
            let start = retained.len().saturating_sub(window);
            ContextWindow::SummaryWindow {
                summary,
                recent: &retained[start..],
            }
        }
        None => ContextWindow::FullHistory(retained),
    }
}
