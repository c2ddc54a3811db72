//! Routes for stories and their turns.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use storyloom_narrative::application::command_handlers::{StoryCreated, TurnResult};
use storyloom_narrative::application::query_handlers::{StorySummaryView, StoryView};
use storyloom_narrative::domain::commands;

use crate::auth::AuthenticatedOwner;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    /// Story genre, e.g. `"noir"`.
    pub genre: String,
    /// Protagonist name.
    pub protagonist: String,
    /// One of `male`, `female`, `non-binary`.
    pub gender: String,
    /// Whether explicit content is permitted.
    #[serde(default)]
    pub mature_enabled: bool,
}

/// Request body for POST /{id}/turn.
#[derive(Debug, Deserialize)]
pub struct SubmitTurnRequest {
    /// One of `SYSTEM`, `CONTINUE`, `DO`, `SAY`, `SEE`, `STORY`.
    pub action_type: String,
    /// The player's input. Ignored for `SYSTEM` and `CONTINUE`.
    #[serde(default)]
    pub text: String,
    /// Token address to rewind to before continuing.
    #[serde(default)]
    pub rewind_token: Option<i64>,
}

/// Response body for DELETE /{id}.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always `true`; failures are reported as errors.
    pub success: bool,
}

/// POST /
#[instrument(skip(state, request), fields(owner_id = %owner_id))]
async fn create_story(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Json(request): Json<CreateStoryRequest>,
) -> Result<(StatusCode, Json<StoryCreated>), ApiError> {
    let command = commands::CreateStory {
        correlation_id: Uuid::new_v4(),
        owner_id,
        genre: request.genre,
        protagonist: request.protagonist,
        gender: request.gender.parse()?,
        mature_enabled: request.mature_enabled,
    };

    info!(correlation_id = %command.correlation_id, "handling create_story command");

    let created = state.engine.create_story(&command).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /me
#[instrument(skip(state), fields(owner_id = %owner_id))]
async fn list_stories(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
) -> Result<Json<Vec<StorySummaryView>>, ApiError> {
    Ok(Json(state.engine.list_stories(owner_id).await?))
}

/// GET /{id}
#[instrument(skip(state), fields(owner_id = %owner_id))]
async fn get_story(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Path(story_id): Path<Uuid>,
) -> Result<Json<StoryView>, ApiError> {
    Ok(Json(state.engine.get_story(story_id, owner_id).await?))
}

/// DELETE /{id}
#[instrument(skip(state), fields(owner_id = %owner_id))]
async fn delete_story(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Path(story_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let command = commands::DeleteStory {
        correlation_id: Uuid::new_v4(),
        story_id,
        owner_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_story command");

    state.engine.delete_story(&command).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// POST /{id}/turn
#[instrument(skip(state, request), fields(owner_id = %owner_id, action_type = %request.action_type))]
async fn submit_turn(
    State(state): State<AppState>,
    AuthenticatedOwner(owner_id): AuthenticatedOwner,
    Path(story_id): Path<Uuid>,
    Json(request): Json<SubmitTurnRequest>,
) -> Result<Json<TurnResult>, ApiError> {
    let command = commands::SubmitTurn {
        correlation_id: Uuid::new_v4(),
        story_id,
        owner_id,
        action_type: request.action_type.parse()?,
        text: request.text,
        rewind_token: request.rewind_token,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_turn command");

    Ok(Json(state.engine.submit_turn(&command).await?))
}

/// Returns the router for stories.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_story))
        .route("/me", get(list_stories))
        .route("/{id}", get(get_story).delete(delete_story))
        .route("/{id}/turn", post(submit_turn))
}
