//! Story persistence abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::story::{NodeDraft, Story, StoryNode};

/// Repository trait for stories and their node sequences.
///
/// Every story lookup is filtered by owner; a story owned by someone else
/// is indistinguishable from a missing one.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Persist a freshly created story (without nodes).
    async fn create_story(&self, story: &Story) -> Result<(), DomainError>;

    /// Load a story if it exists and belongs to `owner_id`.
    async fn find_owned(
        &self,
        story_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Story>, DomainError>;

    /// List the owner's stories, most recently updated first.
    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Story>, DomainError>;

    /// Delete a story and all of its nodes. Returns `false` if no owned
    /// story matched.
    async fn delete_owned(&self, story_id: Uuid, owner_id: Uuid) -> Result<bool, DomainError>;

    /// Load the full node sequence in creation order.
    async fn list_nodes(&self, story_id: Uuid) -> Result<Vec<StoryNode>, DomainError>;

    /// Address `draft` against the current tail and persist it.
    async fn append_node(&self, draft: NodeDraft) -> Result<StoryNode, DomainError>;

    /// Delete every node whose position is strictly greater than `index`.
    /// Returns the number of nodes removed.
    async fn prune_after(&self, story_id: Uuid, index: usize) -> Result<u64, DomainError>;

    /// Replace the story's running summary.
    async fn update_summary(
        &self,
        story_id: Uuid,
        summary: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Optionally prune after `prune_after`, then append `draft`.
    ///
    /// Implementations backed by a transactional store should override this
    /// so that the prune is never visible without the new node.
    async fn commit_turn(
        &self,
        story_id: Uuid,
        prune_after: Option<usize>,
        draft: NodeDraft,
    ) -> Result<StoryNode, DomainError> {
        if let Some(index) = prune_after {
            self.prune_after(story_id, index).await?;
        }
        self.append_node(draft).await
    }
}
