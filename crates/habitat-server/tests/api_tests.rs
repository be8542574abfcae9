//! Integration tests for the player API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The command path runs on the offline mock
//! backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use habitat_core::engine::Engine;
use habitat_core::runner::LoopControl;
use habitat_runner::interpreter::CommandInterpreter;
use habitat_runner::llm::{LlmBackend, MockBackend};
use habitat_runner::persona::SurvivorPersona;
use habitat_runner::prompt::PromptEngine;
use habitat_server::router::build_router;
use habitat_server::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

const SITUATION: &str = "{% if narrative %}{{ narrative }}\n{% endif %}{{ player_input }}";

fn make_state(scenario: &str) -> AppState {
    let mut engine = Engine::new();
    engine.load_scenario(scenario).unwrap();

    let backend = Arc::new(LlmBackend::Mock(MockBackend));
    let prompts =
        Arc::new(PromptEngine::from_sources("persona", SITUATION, "{{ input }}").unwrap());

    AppState::new(
        engine.into_shared(),
        CommandInterpreter::new(Arc::clone(&backend), Arc::clone(&prompts)),
        SurvivorPersona::new(backend, prompts),
    )
}

fn with_control(state: AppState) -> (Arc<AppState>, Arc<LoopControl>) {
    let control = Arc::new(LoopControl::new(1000, 1.0, 0));
    (Arc::new(state.with_control(Arc::clone(&control))), control)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn index_returns_html() {
    let router = build_router(Arc::new(make_state("co2_crisis")));
    let response = router.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Ares Habitat Link"));
    assert!(html.contains("co2_crisis"));
}

#[tokio::test]
async fn telemetry_reflects_the_loaded_scenario() {
    let router = build_router(Arc::new(make_state("co2_crisis")));
    let response = router.oneshot(get("/api/telemetry")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["tick"], 0);
    assert_eq!(json["scenario"], "co2_crisis");
    assert_eq!(json["scenario_solved"], false);
    assert_eq!(json["game_over"], false);
    assert_eq!(json["telemetry"]["co2"], 2.5);
    assert!(json["sensory"].as_str().unwrap().starts_with("[HUD DATA]"));
}

#[tokio::test]
async fn command_gets_a_response_frame() {
    let router = build_router(Arc::new(make_state("co2_crisis")));
    let response = router
        .oneshot(post_json("/api/command", r#"{"text": "search the shelf"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["type"], "RESPONSE");
    assert_eq!(
        json["jack_response"],
        "Found tape and some old hose. Story of my life, man. What now?"
    );
    assert_eq!(json["telemetry"]["inventory"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn dangerous_command_is_intercepted() {
    let router = build_router(Arc::new(make_state("co2_crisis")));
    let response = router
        .oneshot(post_json("/api/command", r#"{"text": "detonate the hatch"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["type"], "INTERCEPT");
    assert!(
        json["jack_response"]
            .as_str()
            .unwrap()
            .starts_with("[SAFETY INTERLOCK]: CRITICAL SAFETY VIOLATION")
    );
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let router = build_router(Arc::new(make_state("co2_crisis")));
    let response = router
        .oneshot(post_json("/api/command", r#"{"text": "  "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn events_list_the_scenario_history() {
    let router = build_router(Arc::new(make_state("co2_crisis")));
    let response = router.oneshot(get("/api/events")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events.first().unwrap()["description"], "Scenario co2_crisis loaded");
}

#[tokio::test]
async fn operator_endpoints_need_loop_control() {
    let router = build_router(Arc::new(make_state("co2_crisis")));
    let response = router.oneshot(get("/api/operator/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn operator_status_and_speed() {
    let (state, control) = with_control(make_state("power_box"));
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(get("/api/operator/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["tick_interval_ms"], 1000);
    assert_eq!(json["scenario"], "power_box");
    assert_eq!(json["stop_requested"], false);

    let response = router
        .clone()
        .oneshot(post_json("/api/operator/speed", r#"{"tick_interval_ms": 250}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["previous_interval_ms"], 1000);
    assert_eq!(json["new_interval_ms"], 250);
    assert_eq!(control.tick_interval_ms(), 250);

    let response = router
        .oneshot(post_json("/api/operator/speed", r#"{"tick_interval_ms": 10}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(control.tick_interval_ms(), 250);
}

#[tokio::test]
async fn operator_stop_sets_the_flag() {
    let (state, control) = with_control(make_state("co2_crisis"));
    let router = build_router(state);

    let response = router
        .oneshot(post_json("/api/operator/stop", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    assert!(control.is_stop_requested());
}
