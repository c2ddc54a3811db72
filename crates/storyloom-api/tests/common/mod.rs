//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use storyloom_core::generation::TextGenerator;
use storyloom_narrative::application::orchestrator::{EngineConfig, TurnOrchestrator};
use storyloom_test_support::{
    FixedClock, InMemoryStoryRepository, RecordingSummarizer, ScriptedGenerator,
};
use tower::ServiceExt;
use uuid::Uuid;

use storyloom_api::auth::OWNER_HEADER;
use storyloom_api::build_router;
use storyloom_api::state::AppState;

/// Build the full app router over an in-memory repository and the given
/// generator. Uses the same route structure as `main.rs`.
pub fn build_test_app(generator: Arc<dyn TextGenerator>) -> Router {
    let engine = TurnOrchestrator::new(
        Arc::new(InMemoryStoryRepository::new()),
        generator,
        Arc::new(RecordingSummarizer::new()),
        Arc::new(FixedClock::standard()),
        EngineConfig::default(),
    );
    build_router(AppState::new(engine))
}

/// Build the app with a generator that replays `responses` in order.
pub fn build_scripted_app(responses: &[&str]) -> Router {
    build_test_app(Arc::new(ScriptedGenerator::new(responses.iter().copied())))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body as `owner_id` and return the response.
pub async fn post_json(
    app: &Router,
    owner_id: Uuid,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(OWNER_HEADER, owner_id.to_string())
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request as `owner_id` and return the response.
pub async fn get_json(app: &Router, owner_id: Uuid, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(OWNER_HEADER, owner_id.to_string())
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a DELETE request as `owner_id` and return the response.
pub async fn delete(app: &Router, owner_id: Uuid, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(OWNER_HEADER, owner_id.to_string())
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Create a noir story starring Vera and return its id.
pub async fn create_noir_story(app: &Router, owner_id: Uuid) -> Uuid {
    let (status, json) = post_json(
        app,
        owner_id,
        "/api/v1/stories",
        &serde_json::json!({
            "genre": "noir",
            "protagonist": "Vera",
            "gender": "female",
            "mature_enabled": false
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["story_id"].as_str().unwrap().parse().unwrap()
}
