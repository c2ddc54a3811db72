//! Turn lifecycle, output parsing and deterministic fallbacks.

use std::fmt;

use storyloom_core::error::DomainError;
use storyloom_core::story::ActionType;

/// Maximum number of paragraphs kept from one generation.
pub const MAX_PARAGRAPHS: usize = 2;

/// Phases a turn moves through. `Failed` is reached only on validation
/// class errors; generator and summarizer failures are absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Map the rewind token to a node.
    ResolveRewind,
    /// Drop nodes after the rewind point.
    Prune,
    /// Choose full history or summary plus recent nodes.
    SelectContext,
    /// Assemble the generator prompt.
    BuildPrompt,
    /// Call the text generator.
    Generate,
    /// Keep at most two paragraphs.
    Parse,
    /// Compute the new node's token range.
    Address,
    /// Commit the prune and the new node.
    Persist,
    /// Hand a batch to the background summarizer.
    Summarize,
    /// The turn completed.
    Done,
    /// The turn was rejected.
    Failed,
}

impl TurnPhase {
    /// Lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolveRewind => "resolve_rewind",
            Self::Prune => "prune",
            Self::SelectContext => "select_context",
            Self::BuildPrompt => "build_prompt",
            Self::Generate => "generate",
            Self::Parse => "parse",
            Self::Address => "address",
            Self::Persist => "persist",
            Self::Summarize => "summarize",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits raw generator output into at most [`MAX_PARAGRAPHS`] trimmed,
/// non-blank paragraphs.
#[must_use]
pub fn parse_paragraphs(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_PARAGRAPHS)
        .map(str::to_owned)
        .collect()
}

/// Text stored on the node for the given paragraphs.
#[must_use]
pub fn generated_text(paragraphs: &[String]) -> String {
    paragraphs.join(" ")
}

/// Validates player input for `action_type` and returns the text to store.
///
/// # Errors
///
/// Returns `DomainError::Validation` if an action that needs text has none.
pub fn user_input_for(action_type: ActionType, text: &str) -> Result<String, DomainError> {
    if !action_type.requires_text() {
        return Ok(String::new());
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!(
            "{action_type} requires non-empty text"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Continuation substituted when the generator fails during a turn.
#[must_use]
pub fn fallback_continuation(action_type: ActionType, user_input: &str) -> String {
    let opening = if action_type.requires_text() {
        format!("You decide to {user_input}.")
    } else {
        "You press onward.".to_owned()
    };
    format!("{opening}\n\nThe world responds in its own way.")
}

/// Opening substituted when the generator fails while creating a story.
#[must_use]
pub fn fallback_opening(protagonist: &str) -> String {
    format!("{protagonist} stands at the edge of something unknown.\n\nThe world waits.")
}
