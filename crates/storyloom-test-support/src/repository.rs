//! Test repositories — `StoryRepository` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storyloom_core::error::DomainError;
use storyloom_core::repository::StoryRepository;
use storyloom_core::story::{NodeDraft, Story, StoryNode};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    stories: HashMap<Uuid, Story>,
    nodes: HashMap<Uuid, Vec<StoryNode>>,
}

/// A fully functional repository held in process memory. Prune and append
/// happen under one mutex, so `commit_turn` is atomic.
#[derive(Debug, Default)]
pub struct InMemoryStoryRepository {
    state: Mutex<State>,
}

impl InMemoryStoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of a story regardless of owner.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn story(&self, story_id: Uuid) -> Option<Story> {
        self.state.lock().unwrap().stories.get(&story_id).cloned()
    }

    /// Returns a snapshot of a story's nodes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn nodes(&self, story_id: Uuid) -> Vec<StoryNode> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(&story_id)
            .cloned()
            .unwrap_or_default()
    }

    fn append_locked(state: &mut State, draft: NodeDraft) -> Result<StoryNode, DomainError> {
        let story_id = draft.story_id;
        let created_at = draft.created_at;
        let story = state
            .stories
            .get_mut(&story_id)
            .ok_or(DomainError::NotFound(story_id))?;
        let nodes = state.nodes.entry(story_id).or_default();
        let node = draft.into_node(nodes.last())?;
        nodes.push(node.clone());
        story.updated_at = created_at;
        Ok(node)
    }

    fn prune_locked(state: &mut State, story_id: Uuid, index: usize) -> u64 {
        let Some(nodes) = state.nodes.get_mut(&story_id) else {
            return 0;
        };
        let keep = (index + 1).min(nodes.len());
        let removed = nodes.len() - keep;
        nodes.truncate(keep);
        removed as u64
    }
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepository {
    async fn create_story(&self, story: &Story) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state.stories.insert(story.id, story.clone());
        state.nodes.insert(story.id, Vec::new());
        Ok(())
    }

    async fn find_owned(
        &self,
        story_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Story>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .stories
            .get(&story_id)
            .filter(|story| story.owner_id == owner_id)
            .cloned())
    }

    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Story>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut stories: Vec<Story> = state
            .stories
            .values()
            .filter(|story| story.owner_id == owner_id)
            .cloned()
            .collect();
        stories.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(stories)
    }

    async fn delete_owned(&self, story_id: Uuid, owner_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        let owned = state
            .stories
            .get(&story_id)
            .is_some_and(|story| story.owner_id == owner_id);
        if owned {
            state.stories.remove(&story_id);
            state.nodes.remove(&story_id);
        }
        Ok(owned)
    }

    async fn list_nodes(&self, story_id: Uuid) -> Result<Vec<StoryNode>, DomainError> {
        Ok(self.nodes(story_id))
    }

    async fn append_node(&self, draft: NodeDraft) -> Result<StoryNode, DomainError> {
        let mut state = self.state.lock().unwrap();
        Self::append_locked(&mut state, draft)
    }

    async fn prune_after(&self, story_id: Uuid, index: usize) -> Result<u64, DomainError> {
        let mut state = self.state.lock().unwrap();
        Ok(Self::prune_locked(&mut state, story_id, index))
    }

    async fn update_summary(
        &self,
        story_id: Uuid,
        summary: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        let story = state
            .stories
            .get_mut(&story_id)
            .ok_or(DomainError::NotFound(story_id))?;
        story.summary = Some(summary.to_owned());
        story.updated_at = updated_at;
        Ok(())
    }

    async fn commit_turn(
        &self,
        story_id: Uuid,
        prune_after: Option<usize>,
        draft: NodeDraft,
    ) -> Result<StoryNode, DomainError> {
        let mut state = self.state.lock().unwrap();
        if !state.stories.contains_key(&story_id) {
            return Err(DomainError::NotFound(story_id));
        }
        // Validate before pruning so a rejected draft leaves the story intact.
        let tail_after_prune = state.nodes.get(&story_id).and_then(|nodes| {
            let keep = prune_after.map_or(nodes.len(), |index| (index + 1).min(nodes.len()));
            keep.checked_sub(1).map(|last| nodes[last].clone())
        });
        draft.clone().into_node(tail_after_prune.as_ref())?;

        if let Some(index) = prune_after {
            Self::prune_locked(&mut state, story_id, index);
        }
        Self::append_locked(&mut state, draft)
    }
}

/// A repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingStoryRepository;

fn connection_refused<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl StoryRepository for FailingStoryRepository {
    async fn create_story(&self, _story: &Story) -> Result<(), DomainError> {
        connection_refused()
    }

    async fn find_owned(
        &self,
        _story_id: Uuid,
        _owner_id: Uuid,
    ) -> Result<Option<Story>, DomainError> {
        connection_refused()
    }

    async fn list_owned(&self, _owner_id: Uuid) -> Result<Vec<Story>, DomainError> {
        connection_refused()
    }

    async fn delete_owned(&self, _story_id: Uuid, _owner_id: Uuid) -> Result<bool, DomainError> {
        connection_refused()
    }

    async fn list_nodes(&self, _story_id: Uuid) -> Result<Vec<StoryNode>, DomainError> {
        connection_refused()
    }

    async fn append_node(&self, _draft: NodeDraft) -> Result<StoryNode, DomainError> {
        connection_refused()
    }

    async fn prune_after(&self, _story_id: Uuid, _index: usize) -> Result<u64, DomainError> {
        connection_refused()
    }

    async fn update_summary(
        &self,
        _story_id: Uuid,
        _summary: &str,
        _updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        connection_refused()
    }
}
