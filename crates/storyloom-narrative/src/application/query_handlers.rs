//! Query handlers for the turn engine.
//!
//! Reads return view DTOs. `get_story` waits for the story's lock so that it
//! never observes a turn or summary refresh halfway through.

use chrono::{DateTime, Utc};
use serde::Serialize;
use storyloom_core::error::DomainError;
use storyloom_core::story::{Gender, Story, StoryNode};
use tracing::instrument;
use uuid::Uuid;

use super::orchestrator::TurnOrchestrator;

/// Read-only view of a story with its full node sequence.
#[derive(Debug, Serialize)]
pub struct StoryView {
    /// The story identifier.
    pub story_id: Uuid,
    /// Story genre.
    pub genre: String,
    /// Protagonist name.
    pub protagonist: String,
    /// Protagonist gender.
    pub gender: Gender,
    /// Whether explicit content is permitted.
    pub mature_enabled: bool,
    /// Running summary, if one has been produced.
    pub summary: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Nodes in chronological order.
    pub nodes: Vec<StoryNode>,
}

/// Listing entry for one story.
#[derive(Debug, Serialize)]
pub struct StorySummaryView {
    /// The story identifier.
    pub story_id: Uuid,
    /// Story genre.
    pub genre: String,
    /// Protagonist name.
    pub protagonist: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Story> for StorySummaryView {
    fn from(story: Story) -> Self {
        Self {
            story_id: story.id,
            genre: story.genre,
            protagonist: story.protagonist,
            created_at: story.created_at,
            updated_at: story.updated_at,
        }
    }
}

impl TurnOrchestrator {
    /// Retrieves an owned story with its nodes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the story is absent or not owned,
    /// or `DomainError::Infrastructure` if persistence fails.
    #[instrument(skip(self))]
    pub async fn get_story(&self, story_id: Uuid, owner_id: Uuid) -> Result<StoryView, DomainError> {
        let _guard = self.locks.acquire(story_id).await;
        let story = self
            .repository
            .find_owned(story_id, owner_id)
            .await?
            .ok_or(DomainError::NotFound(story_id))?;
        let nodes = self.repository.list_nodes(story_id).await?;

        Ok(StoryView {
            story_id: story.id,
            genre: story.genre,
            protagonist: story.protagonist,
            gender: story.gender,
            mature_enabled: story.mature_enabled,
            summary: story.summary,
            created_at: story.created_at,
            updated_at: story.updated_at,
            nodes,
        })
    }

    /// Lists the owner's stories, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if persistence fails.
    #[instrument(skip(self))]
    pub async fn list_stories(&self, owner_id: Uuid) -> Result<Vec<StorySummaryView>, DomainError> {
        let stories = self.repository.list_owned(owner_id).await?;
        Ok(stories.into_iter().map(StorySummaryView::from).collect())
    }
}
