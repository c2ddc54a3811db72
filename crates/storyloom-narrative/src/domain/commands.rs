//! Commands accepted by the turn engine.

use storyloom_core::story::{ActionType, Gender};
use uuid::Uuid;

/// Command to create a story and generate its opening.
#[derive(Debug, Clone)]
pub struct CreateStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The authenticated owner.
    pub owner_id: Uuid,
    /// Story genre.
    pub genre: String,
    /// Protagonist name.
    pub protagonist: String,
    /// Protagonist gender.
    pub gender: Gender,
    /// Whether explicit content is permitted.
    pub mature_enabled: bool,
}

/// Command to play one turn, optionally rewinding first.
#[derive(Debug, Clone)]
pub struct SubmitTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story to advance.
    pub story_id: Uuid,
    /// The authenticated owner.
    pub owner_id: Uuid,
    /// What kind of input the player gave.
    pub action_type: ActionType,
    /// The player's text; ignored for SYSTEM and CONTINUE.
    pub text: String,
    /// Address to rewind to before generating. `None` continues from the
    /// current tail.
    pub rewind_token: Option<i64>,
}

/// Command to delete a story with all of its nodes.
#[derive(Debug, Clone)]
pub struct DeleteStory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The story to delete.
    pub story_id: Uuid,
    /// The authenticated owner.
    pub owner_id: Uuid,
}
