//! Story and node model.
//!
//! A story owns a single chronological sequence of nodes. Each node covers
//! the range `[token_start, token_end]` of the story's logical address
//! space, matched inclusively on both ends. A "token" here is one
//! whitespace-delimited word of generated text; it is unrelated to the
//! token accounting of whatever model produces the text.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Kind of player input that produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Engine-initiated narration (the genesis node).
    System,
    /// Advance the plot without new player input.
    Continue,
    /// The protagonist attempts an action.
    Do,
    /// The protagonist speaks.
    Say,
    /// The protagonist observes something.
    See,
    /// Freeform narrative direction from the player.
    Story,
}

impl ActionType {
    /// Wire name of the action type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "SYSTEM",
            Self::Continue => "CONTINUE",
            Self::Do => "DO",
            Self::Say => "SAY",
            Self::See => "SEE",
            Self::Story => "STORY",
        }
    }

    /// Whether a turn of this type must carry player text.
    #[must_use]
    pub fn requires_text(self) -> bool {
        !matches!(self, Self::System | Self::Continue)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SYSTEM" => Ok(Self::System),
            "CONTINUE" => Ok(Self::Continue),
            "DO" => Ok(Self::Do),
            "SAY" => Ok(Self::Say),
            "SEE" => Ok(Self::See),
            "STORY" => Ok(Self::Story),
            other => Err(DomainError::Validation(format!(
                "unknown action type: {other:?}"
            ))),
        }
    }
}

/// Gender of the protagonist, used for pronoun guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    /// he/him
    Male,
    /// she/her
    Female,
    /// they/them
    NonBinary,
}

impl Gender {
    /// Wire name of the gender.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::NonBinary => "non-binary",
        }
    }

    /// Pronoun set the narration should use for the protagonist.
    #[must_use]
    pub fn pronouns(self) -> &'static str {
        match self {
            Self::Male => "he/him",
            Self::Female => "she/her",
            Self::NonBinary => "they/them",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "non-binary" | "nonbinary" | "non_binary" => Ok(Self::NonBinary),
            other => Err(DomainError::Validation(format!("unknown gender: {other:?}"))),
        }
    }
}

/// A story owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Story {
    /// Story identifier.
    pub id: Uuid,
    /// The owning user.
    pub owner_id: Uuid,
    /// Genre, e.g. "noir".
    pub genre: String,
    /// Protagonist name.
    pub protagonist: String,
    /// Protagonist gender.
    pub gender: Gender,
    /// Whether explicit content is permitted.
    pub mature_enabled: bool,
    /// Running digest of older history, if any has been produced.
    pub summary: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Returns the summary if it holds any non-whitespace text.
    #[must_use]
    pub fn non_empty_summary(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// One persisted turn of narrative output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryNode {
    /// Node identifier, stable for the node's lifetime.
    pub id: Uuid,
    /// The story this node belongs to.
    pub story_id: Uuid,
    /// The node this one chained after; `None` for the genesis node.
    pub parent_node_id: Option<Uuid>,
    /// The action that produced this node.
    pub action_type: ActionType,
    /// Player text; empty for SYSTEM and CONTINUE.
    pub user_input: String,
    /// Narrative text produced for this turn.
    pub generated_text: String,
    /// First address covered by this node.
    pub token_start: i64,
    /// Address one past the last word of this node.
    pub token_end: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl StoryNode {
    /// Whether `token` falls inside `[token_start, token_end]`, both ends
    /// inclusive.
    #[must_use]
    pub fn contains(&self, token: i64) -> bool {
        self.token_start <= token && token <= self.token_end
    }
}

/// A node that has not been addressed or persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDraft {
    /// The story to append to.
    pub story_id: Uuid,
    /// The action that produced the node.
    pub action_type: ActionType,
    /// Player text.
    pub user_input: String,
    /// Narrative text; must contain at least one word.
    pub generated_text: String,
    /// Explicit start address (set after a rewind). `None` chains after
    /// the current tail.
    pub token_start: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NodeDraft {
    /// Addresses the draft against the current tail of its story and
    /// assigns it a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the generated text is empty,
    /// which would produce a zero-width node.
    pub fn into_node(self, tail: Option<&StoryNode>) -> Result<StoryNode, DomainError> {
        let token_count = word_count(&self.generated_text);
        if token_count == 0 {
            return Err(DomainError::Validation(
                "generated text must contain at least one word".to_owned(),
            ));
        }
        let token_start = self
            .token_start
            .unwrap_or_else(|| tail.map_or(0, |node| node.token_end));

        Ok(StoryNode {
            id: Uuid::now_v7(),
            story_id: self.story_id,
            parent_node_id: tail.map(|node| node.id),
            action_type: self.action_type,
            user_input: self.user_input,
            generated_text: self.generated_text,
            token_start,
            token_end: token_start + token_count,
            created_at: self.created_at,
        })
    }
}

/// Number of whitespace-delimited words in `text`.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn word_count(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}
