//! Command handlers for the turn engine.
//!
//! Each handler validates its command, takes the story's lock where the
//! story already exists, and drives the collaborators. Only `NotFound`,
//! `InvalidRewindToken`, `Validation` and persistence errors escape; text
//! generation and summarization failures degrade to fallbacks.

use std::sync::Arc;

use serde::Serialize;
use storyloom_core::clock::Clock;
use storyloom_core::error::DomainError;
use storyloom_core::generation::{SummarizationError, Summarizer};
use storyloom_core::repository::StoryRepository;
use storyloom_core::story::{ActionType, NodeDraft, Story};
use tokio::sync::OwnedMutexGuard;
use tracing::{Instrument, debug, info, instrument, warn};
use uuid::Uuid;

use super::orchestrator::TurnOrchestrator;
use crate::domain::commands::{CreateStory, DeleteStory, SubmitTurn};
use crate::domain::context::{self, ContextWindow};
use crate::domain::prompt;
use crate::domain::rewind;
use crate::domain::summarization::degraded_summary;
use crate::domain::turn::{self, TurnPhase};

/// Result of creating a story.
#[derive(Debug, Clone, Serialize)]
pub struct StoryCreated {
    /// The new story's identifier.
    pub story_id: Uuid,
    /// The genesis node's paragraphs.
    pub opening_paragraphs: Vec<String>,
}

/// Result of a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    /// One or two paragraphs of narration.
    pub paragraphs: Vec<String>,
    /// Address of the new node's first word.
    pub token_start: i64,
    /// Address one past the new node's last word.
    pub token_end: i64,
}

fn required_field(name: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{name} must not be empty")));
    }
    Ok(trimmed.to_owned())
}

fn debug_phase(phase: TurnPhase) {
    debug!(phase = %phase, "turn phase");
}

impl TurnOrchestrator {
    /// Creates a story and generates its genesis node.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank genre or protagonist,
    /// or `DomainError::Infrastructure` if persistence fails.
    #[instrument(skip(self, command), fields(owner_id = %command.owner_id, correlation_id = %command.correlation_id))]
    pub async fn create_story(&self, command: &CreateStory) -> Result<StoryCreated, DomainError> {
        let genre = required_field("genre", &command.genre)?;
        let protagonist = required_field("protagonist", &command.protagonist)?;
        let now = self.clock.now();

        let story = Story {
            id: Uuid::now_v7(),
            owner_id: command.owner_id,
            genre,
            protagonist,
            gender: command.gender,
            mature_enabled: command.mature_enabled,
            summary: None,
            created_at: now,
            updated_at: now,
        };
        self.repository.create_story(&story).await?;

        let prompt = prompt::assemble(
            &story,
            &ContextWindow::FullHistory(&[]),
            ActionType::System,
            "",
        );
        let paragraphs = self
            .generate_paragraphs(&prompt, || turn::fallback_opening(&story.protagonist))
            .await;

        let draft = NodeDraft {
            story_id: story.id,
            action_type: ActionType::System,
            user_input: String::new(),
            generated_text: turn::generated_text(&paragraphs),
            token_start: Some(0),
            created_at: self.clock.now(),
        };
        if let Err(err) = self.repository.append_node(draft).await {
            // Roll back so no story exists without its genesis node.
            if let Err(cleanup) = self.repository.delete_owned(story.id, story.owner_id).await {
                warn!(story_id = %story.id, error = %cleanup, "failed to remove story without genesis node");
            }
            return Err(err);
        }

        info!(story_id = %story.id, "story created");
        Ok(StoryCreated {
            story_id: story.id,
            opening_paragraphs: paragraphs,
        })
    }

    /// Plays one turn: optionally rewinds, generates, and appends a node.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the action needs text and has
    /// none, `DomainError::NotFound` if the story is absent or not owned,
    /// `DomainError::InvalidRewindToken` if the rewind token matches no
    /// node (nothing is mutated), or `DomainError::Infrastructure` if
    /// persistence fails.
    #[instrument(
        skip(self, command),
        fields(
            story_id = %command.story_id,
            action_type = %command.action_type,
            correlation_id = %command.correlation_id,
        )
    )]
    pub async fn submit_turn(&self, command: &SubmitTurn) -> Result<TurnResult, DomainError> {
        let result = self.run_turn(command).await;
        match &result {
            Ok(_) => debug_phase(TurnPhase::Done),
            Err(err) => debug!(phase = %TurnPhase::Failed, error = %err, "turn phase"),
        }
        result
    }

    async fn run_turn(&self, command: &SubmitTurn) -> Result<TurnResult, DomainError> {
        let action_type = command.action_type;
        let user_input = turn::user_input_for(action_type, &command.text)?;

        let guard = self.locks.acquire(command.story_id).await;

        let story = self
            .repository
            .find_owned(command.story_id, command.owner_id)
            .await?
            .ok_or(DomainError::NotFound(command.story_id))?;
        let nodes = self.repository.list_nodes(story.id).await?;

        debug_phase(TurnPhase::ResolveRewind);
        let rewind_point = command
            .rewind_token
            .map(|token| rewind::resolve(&nodes, token))
            .transpose()?;

        // The prune itself is deferred to `commit_turn` so that it lands
        // together with the new node.
        debug_phase(TurnPhase::Prune);
        let retained = match rewind_point {
            Some(point) => &nodes[..=point.index],
            None => &nodes[..],
        };

        debug_phase(TurnPhase::SelectContext);
        let window = context::select(&story, retained, self.config.context_window);

        debug_phase(TurnPhase::BuildPrompt);
        let prompt = prompt::assemble(&story, &window, action_type, &user_input);

        debug_phase(TurnPhase::Generate);
        let paragraphs = self
            .generate_paragraphs(&prompt, || {
                turn::fallback_continuation(action_type, &user_input)
            })
            .await;

        debug_phase(TurnPhase::Parse);
        let generated_text = turn::generated_text(&paragraphs);

        debug_phase(TurnPhase::Address);
        let draft = NodeDraft {
            story_id: story.id,
            action_type,
            user_input,
            generated_text,
            token_start: rewind_point.map(|point| point.token),
            created_at: self.clock.now(),
        };

        debug_phase(TurnPhase::Persist);
        let node = self
            .repository
            .commit_turn(story.id, rewind_point.map(|point| point.index), draft)
            .await?;

        let result = TurnResult {
            paragraphs,
            token_start: node.token_start,
            token_end: node.token_end,
        };

        let mut history = retained.to_vec();
        history.push(node);
        if let Some(batch) = self.scheduler().due_batch(&history) {
            debug_phase(TurnPhase::Summarize);
            self.spawn_summary_refresh(guard, &story, batch);
        }

        Ok(result)
    }

    /// Runs summarization in the background while keeping the story locked,
    /// so the next turn on this story sees the refreshed summary.
    fn spawn_summary_refresh(&self, guard: OwnedMutexGuard<()>, story: &Story, batch: String) {
        let repository = Arc::clone(&self.repository);
        let summarizer = Arc::clone(&self.summarizer);
        let clock = Arc::clone(&self.clock);
        let timeout = self.config.generation_timeout;
        let story_id = story.id;
        let current = story.summary.clone();

        tokio::spawn(
            async move {
                let _guard = guard;
                refresh_summary(
                    repository.as_ref(),
                    summarizer.as_ref(),
                    clock.as_ref(),
                    timeout,
                    story_id,
                    current.as_deref(),
                    &batch,
                )
                .await;
            }
            .in_current_span(),
        );
    }

    /// Deletes a story and all of its nodes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the story is absent or not owned,
    /// or `DomainError::Infrastructure` if persistence fails.
    #[instrument(skip(self, command), fields(story_id = %command.story_id, correlation_id = %command.correlation_id))]
    pub async fn delete_story(&self, command: &DeleteStory) -> Result<(), DomainError> {
        let _guard = self.locks.acquire(command.story_id).await;
        if !self
            .repository
            .delete_owned(command.story_id, command.owner_id)
            .await?
        {
            return Err(DomainError::NotFound(command.story_id));
        }
        info!("story deleted");
        Ok(())
    }
}

/// Folds `batch` into the story summary. Never fails: a summarizer error
/// or timeout degrades to appending the raw batch, and a persistence error
/// is logged.
async fn refresh_summary(
    repository: &dyn StoryRepository,
    summarizer: &dyn Summarizer,
    clock: &dyn Clock,
    timeout: std::time::Duration,
    story_id: Uuid,
    current: Option<&str>,
    batch: &str,
) {
    let outcome = match tokio::time::timeout(timeout, summarizer.summarize(current, batch)).await {
        Ok(Ok(summary)) if !summary.trim().is_empty() => Ok(summary),
        Ok(Ok(_)) => Err(SummarizationError("empty summary".to_owned())),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(SummarizationError("timed out".to_owned())),
    };
    let summary = outcome.unwrap_or_else(|err| {
        warn!(%story_id, error = %err, "summarization failed, appending raw history");
        degraded_summary(current, batch)
    });

    match repository.update_summary(story_id, &summary, clock.now()).await {
        Ok(()) => debug!(%story_id, "story summary refreshed"),
        Err(err) => warn!(%story_id, error = %err, "failed to persist story summary"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use storyloom_core::error::DomainError;
    use storyloom_core::generation::{Summarizer, TextGenerator};
    use storyloom_core::story::{ActionType, Gender, StoryNode};
    use storyloom_test_support::{
        FailingGenerator, FailingStoryRepository, FailingSummarizer, FixedClock,
        InMemoryStoryRepository, RecordingSummarizer, ScriptedGenerator, StallingGenerator,
        StallingSummarizer,
    };
    use uuid::Uuid;

    use crate::application::orchestrator::{EngineConfig, TurnOrchestrator};
    use crate::domain::commands::{CreateStory, DeleteStory, SubmitTurn};

    const OPENING: &str = "Rain needles the neon outside your office.\n\nThe phone has not rung in days.";
    const TURN: &str = "The door groans open.\n\nA draft carries the smell of cordite.";

    struct Harness {
        engine: TurnOrchestrator,
        repo: Arc<InMemoryStoryRepository>,
        owner_id: Uuid,
    }

    fn harness_with(
        generator: Arc<dyn TextGenerator>,
        summarizer: Arc<dyn Summarizer>,
        config: EngineConfig,
    ) -> Harness {
        let repo = Arc::new(InMemoryStoryRepository::new());
        let engine = TurnOrchestrator::new(
            repo.clone(),
            generator,
            summarizer,
            Arc::new(FixedClock::standard()),
            config,
        );
        Harness {
            engine,
            repo,
            owner_id: Uuid::new_v4(),
        }
    }

    fn harness() -> Harness {
        harness_with(
            Arc::new(ScriptedGenerator::new([OPENING, TURN])),
            Arc::new(RecordingSummarizer::new()),
            EngineConfig::default(),
        )
    }

    fn create_command(owner_id: Uuid) -> CreateStory {
        CreateStory {
            correlation_id: Uuid::new_v4(),
            owner_id,
            genre: "noir".to_owned(),
            protagonist: "Vera".to_owned(),
            gender: Gender::Female,
            mature_enabled: false,
        }
    }

    fn turn_command(story_id: Uuid, owner_id: Uuid, rewind_token: Option<i64>) -> SubmitTurn {
        SubmitTurn {
            correlation_id: Uuid::new_v4(),
            story_id,
            owner_id,
            action_type: ActionType::Do,
            text: "open the door".to_owned(),
            rewind_token,
        }
    }

    fn assert_contiguous(nodes: &[StoryNode]) {
        assert_eq!(nodes[0].token_start, 0);
        for pair in nodes.windows(2) {
            assert_eq!(pair[1].token_start, pair[0].token_end);
        }
        for node in nodes {
            assert!(node.token_end > node.token_start);
        }
    }

    #[tokio::test]
    async fn test_create_story_persists_genesis_node() {
        // Arrange
        let h = harness();

        // Act
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        // Assert
        assert_eq!(
            created.opening_paragraphs,
            vec![
                "Rain needles the neon outside your office.",
                "The phone has not rung in days."
            ]
        );
        let nodes = h.repo.nodes(created.story_id);
        assert_eq!(nodes.len(), 1);
        let genesis = &nodes[0];
        assert_eq!(genesis.action_type, ActionType::System);
        assert_eq!(genesis.user_input, "");
        assert_eq!(genesis.parent_node_id, None);
        assert_eq!(genesis.token_start, 0);
        assert!(genesis.token_end > 0);
        assert_eq!(genesis.token_end, 14);
    }

    #[tokio::test]
    async fn test_create_story_rejects_blank_protagonist() {
        let h = harness();
        let mut command = create_command(h.owner_id);
        command.protagonist = "   ".to_owned();

        let result = h.engine.create_story(&command).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_story_uses_fallback_when_generator_fails() {
        let h = harness_with(
            Arc::new(FailingGenerator),
            Arc::new(RecordingSummarizer::new()),
            EngineConfig::default(),
        );

        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        assert_eq!(
            created.opening_paragraphs,
            vec!["Vera stands at the edge of something unknown.", "The world waits."]
        );
        assert_eq!(h.repo.nodes(created.story_id)[0].token_start, 0);
    }

    #[tokio::test]
    async fn test_create_story_surfaces_persistence_failure() {
        let engine = TurnOrchestrator::new(
            Arc::new(FailingStoryRepository),
            Arc::new(ScriptedGenerator::repeating(OPENING)),
            Arc::new(RecordingSummarizer::new()),
            Arc::new(FixedClock::standard()),
            EngineConfig::default(),
        );

        let result = engine.create_story(&create_command(Uuid::new_v4())).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_submit_turn_rewinding_to_genesis_end_appends_second_node() {
        // Arrange
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();
        let genesis = h.repo.nodes(created.story_id)[0].clone();

        // Act
        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, Some(genesis.token_end)))
            .await
            .unwrap();

        // Assert
        assert_eq!(result.token_start, genesis.token_end);
        assert!(result.token_end > result.token_start);
        assert_eq!(result.paragraphs.len(), 2);
        let nodes = h.repo.nodes(created.story_id);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].parent_node_id, Some(genesis.id));
        assert_eq!(nodes[1].user_input, "open the door");
        assert_contiguous(&nodes);
    }

    #[tokio::test]
    async fn test_submit_turn_without_rewind_chains_after_tail() {
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        for _ in 0..3 {
            h.engine
                .submit_turn(&turn_command(created.story_id, h.owner_id, None))
                .await
                .unwrap();
        }

        let nodes = h.repo.nodes(created.story_id);
        assert_eq!(nodes.len(), 4);
        assert_contiguous(&nodes);
    }

    #[tokio::test]
    async fn test_submit_turn_rewind_discards_tail_after_resolved_node() {
        // Arrange
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();
        for _ in 0..3 {
            h.engine
                .submit_turn(&turn_command(created.story_id, h.owner_id, None))
                .await
                .unwrap();
        }
        let before = h.repo.nodes(created.story_id);
        let rewind_to = before[1].token_end;

        // Act
        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, Some(rewind_to)))
            .await
            .unwrap();

        // Assert
        let after = h.repo.nodes(created.story_id);
        assert_eq!(after.len(), 3);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2].token_start, rewind_to);
        assert_eq!(result.token_start, rewind_to);
        assert_eq!(after[2].parent_node_id, Some(before[1].id));
        assert_contiguous(&after);
    }

    #[tokio::test]
    async fn test_submit_turn_rewind_inside_node_starts_at_requested_token() {
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();
        h.engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, None))
            .await
            .unwrap();
        let before = h.repo.nodes(created.story_id);
        let inside_genesis = before[0].token_end - 3;

        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, Some(inside_genesis)))
            .await
            .unwrap();

        let after = h.repo.nodes(created.story_id);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], before[0]);
        assert_eq!(result.token_start, inside_genesis);
    }

    #[tokio::test]
    async fn test_submit_turn_invalid_rewind_token_mutates_nothing() {
        // Arrange
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();
        h.engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, None))
            .await
            .unwrap();
        let before = h.repo.nodes(created.story_id);

        // Act
        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, Some(999_999)))
            .await;

        // Assert
        match result {
            Err(DomainError::InvalidRewindToken(token)) => assert_eq!(token, 999_999),
            other => panic!("expected InvalidRewindToken, got {other:?}"),
        }
        assert_eq!(h.repo.nodes(created.story_id), before);
    }

    #[tokio::test]
    async fn test_submit_turn_on_foreign_story_is_not_found() {
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, Uuid::new_v4(), None))
            .await;

        match result {
            Err(DomainError::NotFound(id)) => assert_eq!(id, created.story_id),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_turn_missing_text_is_validation_failure() {
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();
        let mut command = turn_command(created.story_id, h.owner_id, None);
        command.action_type = ActionType::Say;
        command.text = "  ".to_owned();

        let result = h.engine.submit_turn(&command).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(h.repo.nodes(created.story_id).len(), 1);
    }

    #[tokio::test]
    async fn test_submit_turn_absorbs_generator_failure() {
        let h = harness_with(
            Arc::new(FailingGenerator),
            Arc::new(RecordingSummarizer::new()),
            EngineConfig::default(),
        );
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();
        let genesis_end = h.repo.nodes(created.story_id)[0].token_end;

        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, None))
            .await
            .unwrap();

        assert_eq!(
            result.paragraphs,
            vec!["You decide to open the door.", "The world responds in its own way."]
        );
        assert_eq!(result.token_start, genesis_end);
        assert_eq!(result.token_end, genesis_end + 13);
    }

    #[tokio::test]
    async fn test_submit_turn_absorbs_generator_timeout() {
        let config = EngineConfig {
            generation_timeout: Duration::from_millis(20),
            ..EngineConfig::default()
        };
        let h = harness_with(
            Arc::new(StallingGenerator {
                delay: Duration::from_secs(5),
                response: TURN.to_owned(),
            }),
            Arc::new(RecordingSummarizer::new()),
            config,
        );
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, None))
            .await
            .unwrap();

        assert!(!result.paragraphs.is_empty());
        assert!(result.token_end > result.token_start);
        assert_eq!(h.repo.nodes(created.story_id).len(), 2);
    }

    #[tokio::test]
    async fn test_submit_turn_treats_blank_output_as_failure() {
        let h = harness_with(
            Arc::new(ScriptedGenerator::new([OPENING, "  \n\n  "])),
            Arc::new(RecordingSummarizer::new()),
            EngineConfig::default(),
        );
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, None))
            .await
            .unwrap();

        assert_eq!(result.paragraphs[0], "You decide to open the door.");
    }

    #[tokio::test]
    async fn test_submit_turn_uses_summary_window_once_summary_exists() {
        // Arrange
        let generator = Arc::new(ScriptedGenerator::new([OPENING, TURN]));
        let h = harness_with(
            generator.clone(),
            Arc::new(RecordingSummarizer::new()),
            EngineConfig::default(),
        );
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();
        for _ in 0..4 {
            h.engine
                .submit_turn(&turn_command(created.story_id, h.owner_id, None))
                .await
                .unwrap();
        }

        // Act: the sixth node's prompt is built after the first summary.
        h.engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, None))
            .await
            .unwrap();

        // Assert
        let prompts = generator.prompts();
        assert!(prompts[4].contains("Full story so far"));
        assert!(prompts[5].contains("Summary of earlier events:\nsummary #1"));
    }

    #[tokio::test]
    async fn test_summarization_fires_exactly_on_interval_multiples() {
        // Arrange
        let summarizer = Arc::new(RecordingSummarizer::new());
        let h = harness_with(
            Arc::new(ScriptedGenerator::new([OPENING, TURN])),
            summarizer.clone(),
            EngineConfig::default(),
        );
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        // Act + Assert
        let mut fired_at = Vec::new();
        for _ in 0..10 {
            h.engine
                .submit_turn(&turn_command(created.story_id, h.owner_id, None))
                .await
                .unwrap();
            // Reading through the engine waits for any pending refresh.
            let view = h.engine.get_story(created.story_id, h.owner_id).await.unwrap();
            if summarizer.calls().len() > fired_at.len() {
                fired_at.push(view.nodes.len());
            }
        }

        assert_eq!(fired_at, vec![5, 10]);
        let calls = summarizer.calls();
        assert_eq!(calls[0].0, None);
        assert_eq!(calls[1].0.as_deref(), Some("summary #1"));
        let nodes = h.repo.nodes(created.story_id);
        let expected_batch = nodes[5..10]
            .iter()
            .map(|node| node.generated_text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(calls[1].1, expected_batch);
        assert_eq!(
            h.repo.story(created.story_id).unwrap().summary.as_deref(),
            Some("summary #2")
        );
    }

    #[tokio::test]
    async fn test_summarization_failure_degrades_to_raw_concatenation() {
        let h = harness_with(
            Arc::new(ScriptedGenerator::new([OPENING, TURN])),
            Arc::new(FailingSummarizer),
            EngineConfig {
                summary_interval: 2,
                ..EngineConfig::default()
            },
        );
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        let result = h
            .engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, None))
            .await;
        let view = h.engine.get_story(created.story_id, h.owner_id).await.unwrap();

        assert!(result.is_ok());
        let nodes = h.repo.nodes(created.story_id);
        let expected = format!("{}\n\n{}", nodes[0].generated_text, nodes[1].generated_text);
        assert_eq!(view.summary.as_deref(), Some(expected.as_str()));
    }

    /// Plays one turn with a summary interval of two and returns the
    /// summary stored afterwards alongside the raw concatenation.
    async fn summary_after_second_node(summarizer: StallingSummarizer) -> (Option<String>, String) {
        let h = harness_with(
            Arc::new(ScriptedGenerator::new([OPENING, TURN])),
            Arc::new(summarizer),
            EngineConfig {
                summary_interval: 2,
                generation_timeout: Duration::from_millis(50),
                ..EngineConfig::default()
            },
        );
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();
        h.engine
            .submit_turn(&turn_command(created.story_id, h.owner_id, None))
            .await
            .unwrap();
        let view = h.engine.get_story(created.story_id, h.owner_id).await.unwrap();

        let nodes = h.repo.nodes(created.story_id);
        let raw = format!("{}\n\n{}", nodes[0].generated_text, nodes[1].generated_text);
        (view.summary, raw)
    }

    #[tokio::test]
    async fn test_summarization_timeout_degrades_to_raw_concatenation() {
        let (summary, raw) = summary_after_second_node(StallingSummarizer {
            delay: Duration::from_secs(5),
            response: "too late".to_owned(),
        })
        .await;

        assert_eq!(summary.as_deref(), Some(raw.as_str()));
    }

    #[tokio::test]
    async fn test_blank_summary_degrades_to_raw_concatenation() {
        let (summary, raw) = summary_after_second_node(StallingSummarizer {
            delay: Duration::ZERO,
            response: "  \n ".to_owned(),
        })
        .await;

        assert_eq!(summary.as_deref(), Some(raw.as_str()));
    }

    #[tokio::test]
    async fn test_summary_is_stored_when_summarizer_answers_in_time() {
        let (summary, _) = summary_after_second_node(StallingSummarizer {
            delay: Duration::ZERO,
            response: "Vera took the case.".to_owned(),
        })
        .await;

        assert_eq!(summary.as_deref(), Some("Vera took the case."));
    }

    #[tokio::test]
    async fn test_concurrent_turns_on_one_story_stay_contiguous() {
        // Arrange
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        // Act
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let engine = h.engine.clone();
                let command = turn_command(created.story_id, h.owner_id, None);
                tokio::spawn(async move { engine.submit_turn(&command).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // Assert
        let nodes = h.repo.nodes(created.story_id);
        assert_eq!(nodes.len(), 9);
        assert_contiguous(&nodes);
    }

    #[tokio::test]
    async fn test_delete_story_removes_owned_story_only() {
        let h = harness();
        let created = h.engine.create_story(&create_command(h.owner_id)).await.unwrap();

        let foreign = h
            .engine
            .delete_story(&DeleteStory {
                correlation_id: Uuid::new_v4(),
                story_id: created.story_id,
                owner_id: Uuid::new_v4(),
            })
            .await;
        let own = h
            .engine
            .delete_story(&DeleteStory {
                correlation_id: Uuid::new_v4(),
                story_id: created.story_id,
                owner_id: h.owner_id,
            })
            .await;

        assert!(matches!(foreign, Err(DomainError::NotFound(_))));
        assert!(own.is_ok());
        assert!(h.repo.story(created.story_id).is_none());
        assert!(h.repo.nodes(created.story_id).is_empty());
    }
}
