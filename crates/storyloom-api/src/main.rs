//! Storyloom API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use storyloom_api::config::AppConfig;
use storyloom_api::error::AppError;
use storyloom_api::state::AppState;
use storyloom_api::{build_engine, build_router, telemetry};
use storyloom_store::pg_story_repository::PgStoryRepository;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let _telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Storyloom API server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    storyloom_store::MIGRATOR.run(&pool).await?;

    let engine = build_engine(&config, Arc::new(PgStoryRepository::new(pool)))?;
    let app = build_router(AppState::new(engine));

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
