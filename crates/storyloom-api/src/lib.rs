//! Storyloom API — HTTP surface over the turn engine.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use storyloom_core::clock::SystemClock;
use storyloom_core::repository::StoryRepository;
use storyloom_narrative::application::orchestrator::TurnOrchestrator;
use storyloom_ollama::OllamaClient;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Wires the turn engine over `repository`, with one Ollama client serving
/// as both text generator and summarizer.
///
/// # Errors
///
/// Returns `AppError::Config` if the Ollama HTTP client cannot be built.
pub fn build_engine(
    config: &AppConfig,
    repository: Arc<dyn StoryRepository>,
) -> Result<TurnOrchestrator, AppError> {
    let ollama = Arc::new(
        OllamaClient::new(
            config.ollama_url.as_str(),
            config.ollama_model.as_str(),
            config.generation_timeout,
        )
        .map_err(|e| AppError::Config(format!("cannot build Ollama client: {e}")))?,
    );
    tracing::info!(url = %config.ollama_url, model = %config.ollama_model, "using Ollama");

    Ok(TurnOrchestrator::new(
        repository,
        ollama.clone(),
        ollama,
        Arc::new(SystemClock),
        config.engine_config(),
    ))
}

/// Builds the full application router.
pub fn build_router(app_state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/stories", routes::stories::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
