//! `PostgreSQL` implementation of the `StoryRepository` trait.
//!
//! Node order is kept in an explicit `position` column. Deletions only ever
//! remove a tail, so positions stay dense and a node's position equals its
//! index in the sequence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use storyloom_core::error::DomainError;
use storyloom_core::repository::StoryRepository;
use storyloom_core::story::{NodeDraft, Story, StoryNode};

const STORY_COLUMNS: &str = "id, owner_id, genre, protagonist, gender, mature_enabled, summary, \
     created_at, updated_at";

const NODE_COLUMNS: &str = "id, story_id, position, parent_node_id, action_type, user_input, \
     generated_text, token_start, token_end, created_at";

/// PostgreSQL-backed story repository.
#[derive(Debug, Clone)]
pub struct PgStoryRepository {
    pool: PgPool,
}

impl PgStoryRepository {
    /// Creates a new `PgStoryRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

fn corrupt(column: &str, err: &DomainError) -> DomainError {
    DomainError::Infrastructure(format!("corrupt {column} column: {err}"))
}

fn story_from_row(row: &PgRow) -> Result<Story, DomainError> {
    let gender: String = row.try_get("gender").map_err(infrastructure)?;
    Ok(Story {
        id: row.try_get("id").map_err(infrastructure)?,
        owner_id: row.try_get("owner_id").map_err(infrastructure)?,
        genre: row.try_get("genre").map_err(infrastructure)?,
        protagonist: row.try_get("protagonist").map_err(infrastructure)?,
        gender: gender.parse().map_err(|e| corrupt("gender", &e))?,
        mature_enabled: row.try_get("mature_enabled").map_err(infrastructure)?,
        summary: row.try_get("summary").map_err(infrastructure)?,
        created_at: row.try_get("created_at").map_err(infrastructure)?,
        updated_at: row.try_get("updated_at").map_err(infrastructure)?,
    })
}

fn node_from_row(row: &PgRow) -> Result<StoryNode, DomainError> {
    let action_type: String = row.try_get("action_type").map_err(infrastructure)?;
    Ok(StoryNode {
        id: row.try_get("id").map_err(infrastructure)?,
        story_id: row.try_get("story_id").map_err(infrastructure)?,
        parent_node_id: row.try_get("parent_node_id").map_err(infrastructure)?,
        action_type: action_type
            .parse()
            .map_err(|e| corrupt("action_type", &e))?,
        user_input: row.try_get("user_input").map_err(infrastructure)?,
        generated_text: row.try_get("generated_text").map_err(infrastructure)?,
        token_start: row.try_get("token_start").map_err(infrastructure)?,
        token_end: row.try_get("token_end").map_err(infrastructure)?,
        created_at: row.try_get("created_at").map_err(infrastructure)?,
    })
}

fn position_of(index: usize) -> Result<i64, DomainError> {
    i64::try_from(index)
        .map_err(|_| DomainError::Validation(format!("node index out of range: {index}")))
}

/// Takes a row lock on the story so concurrent writers on other
/// connections queue behind this transaction.
async fn lock_story(conn: &mut PgConnection, story_id: Uuid) -> Result<(), DomainError> {
    sqlx::query("SELECT id FROM stories WHERE id = $1 FOR UPDATE")
        .bind(story_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(infrastructure)?
        .map(|_| ())
        .ok_or(DomainError::NotFound(story_id))
}

async fn delete_after(
    conn: &mut PgConnection,
    story_id: Uuid,
    index: usize,
) -> Result<u64, DomainError> {
    let result = sqlx::query("DELETE FROM story_nodes WHERE story_id = $1 AND position > $2")
        .bind(story_id)
        .bind(position_of(index)?)
        .execute(&mut *conn)
        .await
        .map_err(infrastructure)?;
    Ok(result.rows_affected())
}

async fn insert_node(conn: &mut PgConnection, draft: NodeDraft) -> Result<StoryNode, DomainError> {
    let story_id = draft.story_id;
    let tail_row = sqlx::query(&format!(
        "SELECT {NODE_COLUMNS} FROM story_nodes WHERE story_id = $1 \
         ORDER BY position DESC LIMIT 1"
    ))
    .bind(story_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(infrastructure)?;

    let (tail, position) = match tail_row {
        Some(row) => {
            let tail_position: i64 = row.try_get("position").map_err(infrastructure)?;
            (Some(node_from_row(&row)?), tail_position + 1)
        }
        None => (None, 0),
    };
    let node = draft.into_node(tail.as_ref())?;

    sqlx::query(&format!(
        "INSERT INTO story_nodes ({NODE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
    ))
    .bind(node.id)
    .bind(node.story_id)
    .bind(position)
    .bind(node.parent_node_id)
    .bind(node.action_type.as_str())
    .bind(&node.user_input)
    .bind(&node.generated_text)
    .bind(node.token_start)
    .bind(node.token_end)
    .bind(node.created_at)
    .execute(&mut *conn)
    .await
    .map_err(infrastructure)?;

    sqlx::query("UPDATE stories SET updated_at = $2 WHERE id = $1")
        .bind(story_id)
        .bind(node.created_at)
        .execute(&mut *conn)
        .await
        .map_err(infrastructure)?;

    Ok(node)
}

#[async_trait]
impl StoryRepository for PgStoryRepository {
    async fn create_story(&self, story: &Story) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO stories ({STORY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(story.id)
        .bind(story.owner_id)
        .bind(&story.genre)
        .bind(&story.protagonist)
        .bind(story.gender.as_str())
        .bind(story.mature_enabled)
        .bind(&story.summary)
        .bind(story.created_at)
        .bind(story.updated_at)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }

    async fn find_owned(
        &self,
        story_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Story>, DomainError> {
        sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 AND owner_id = $2"
        ))
        .bind(story_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?
        .as_ref()
        .map(story_from_row)
        .transpose()
    }

    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Story>, DomainError> {
        sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE owner_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?
        .iter()
        .map(story_from_row)
        .collect()
    }

    async fn delete_owned(&self, story_id: Uuid, owner_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND owner_id = $2")
            .bind(story_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_nodes(&self, story_id: Uuid) -> Result<Vec<StoryNode>, DomainError> {
        sqlx::query(&format!(
            "SELECT {NODE_COLUMNS} FROM story_nodes WHERE story_id = $1 ORDER BY position ASC"
        ))
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?
        .iter()
        .map(node_from_row)
        .collect()
    }

    async fn append_node(&self, draft: NodeDraft) -> Result<StoryNode, DomainError> {
        self.commit_turn(draft.story_id, None, draft).await
    }

    async fn prune_after(&self, story_id: Uuid, index: usize) -> Result<u64, DomainError> {
        let mut conn = self.pool.acquire().await.map_err(infrastructure)?;
        delete_after(&mut conn, story_id, index).await
    }

    async fn update_summary(
        &self,
        story_id: Uuid,
        summary: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE stories SET summary = $2, updated_at = $3 WHERE id = $1")
            .bind(story_id)
            .bind(summary)
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(story_id));
        }
        Ok(())
    }

    async fn commit_turn(
        &self,
        story_id: Uuid,
        prune_after: Option<usize>,
        draft: NodeDraft,
    ) -> Result<StoryNode, DomainError> {
        let mut tx = self.pool.begin().await.map_err(infrastructure)?;
        lock_story(&mut tx, story_id).await?;

        if let Some(index) = prune_after {
            let pruned = delete_after(&mut tx, story_id, index).await?;
            debug!(%story_id, pruned, "pruned story tail");
        }
        let node = insert_node(&mut tx, draft).await?;

        tx.commit().await.map_err(infrastructure)?;
        Ok(node)
    }
}
