//! Integration tests for the environment API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic, error mapping,
//! and CORS without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use envserve_api::router::build_router;
use envserve_api::state::{AppState, Session};
use envserve_sim::{
    Environment, Frame, FrozenLakeConfig, MapName, Observation, ObservationKind, SimError,
    TaskConfig, TaskKind, Transition, build_environment,
};
use serde_json::Value;
use tower::ServiceExt;

fn make_app(kind: TaskKind) -> Router {
    let config = TaskConfig {
        kind,
        seed: Some(7),
        max_episode_steps: None,
        frozen_lake: FrozenLakeConfig {
            map: MapName::Small,
            desc: None,
            slippery: false,
        },
    };
    let env = build_environment(&config).unwrap();
    build_router(Arc::new(AppState::new(Session::new(env))))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(path: &str, body: &'static str) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn decode_frame(image: &Value) -> image::DynamicImage {
    let bytes = STANDARD.decode(image.as_str().unwrap()).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).unwrap()
}

// =========================================================================
// Cart-pole
// =========================================================================

#[tokio::test]
async fn cart_pole_reset_returns_state_and_png() {
    let app = make_app(TaskKind::CartPole);
    let (status, json) = send(&app, Request::post("/reset").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    let state = json["state"].as_array().unwrap();
    assert_eq!(state.len(), 4);
    for value in state {
        assert!(value.as_f64().unwrap().abs() <= 0.05);
    }

    let frame = decode_frame(&json["image"]);
    assert_eq!((frame.width(), frame.height()), (600, 400));
}

#[tokio::test]
async fn cart_pole_step_returns_full_payload() {
    let app = make_app(TaskKind::CartPole);
    send(&app, post("/reset", "{}")).await;

    let (status, json) = send(&app, post("/step", r#"{"action": 1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"].as_array().unwrap().len(), 4);
    assert!((json["reward"].as_f64().unwrap() - 1.0).abs() < f64::EPSILON);
    assert_eq!(json["done"], false);
    assert_eq!(json["truncated"], false);
    assert_eq!(json["move"], "Right");
    decode_frame(&json["image"]);

    let (_, json) = send(&app, post("/step", r#"{"action": 0}"#)).await;
    assert_eq!(json["move"], "Left");
}

#[tokio::test]
async fn cart_pole_rejects_out_of_range_action() {
    let app = make_app(TaskKind::CartPole);
    send(&app, post("/reset", "{}")).await;

    for body in [r#"{"action": 4}"#, r#"{"action": 2}"#, r#"{"action": -1}"#] {
        let (status, json) = send(&app, post("/step", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(json["error"], "Invalid action");
        assert_eq!(json["status"], 400);
    }
}

#[tokio::test]
async fn cart_pole_episode_ends_when_pushed_one_way() {
    let app = make_app(TaskKind::CartPole);
    send(&app, post("/reset", "{}")).await;

    let mut done = false;
    for _ in 0..200 {
        let (status, json) = send(&app, post("/step", r#"{"action": 1}"#)).await;
        assert_eq!(status, StatusCode::OK);
        if json["done"] == true {
            assert!((json["reward"].as_f64().unwrap() - 1.0).abs() < f64::EPSILON);
            done = true;
            break;
        }
    }
    assert!(done, "constant push should tip the pole");

    // Stepping past termination is allowed but earns nothing.
    let (status, json) = send(&app, post("/step", r#"{"action": 1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["reward"].as_f64().unwrap().abs() < f64::EPSILON);
}

// =========================================================================
// Frozen lake
// =========================================================================

#[tokio::test]
async fn frozen_lake_reset_starts_at_zero() {
    let app = make_app(TaskKind::FrozenLake);
    let (status, json) = send(&app, post("/reset", "{}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], 0);
    let frame = decode_frame(&json["image"]);
    assert_eq!((frame.width(), frame.height()), (256, 256));
}

#[tokio::test]
async fn frozen_lake_step_down_moves_one_row() {
    let app = make_app(TaskKind::FrozenLake);
    send(&app, post("/reset", "{}")).await;

    let (status, json) = send(&app, post("/step", r#"{"action": 1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], 4);
    assert_eq!(json["move"], "Down");
    assert_eq!(json["done"], false);
    assert_eq!(json["truncated"], false);
    assert!(json["reward"].as_f64().unwrap().abs() < f64::EPSILON);
}

#[tokio::test]
async fn frozen_lake_reaching_goal_pays_one() {
    let app = make_app(TaskKind::FrozenLake);
    send(&app, post("/reset", "{}")).await;

    // 0 -> 4 -> 8 -> 9 -> 13 -> 14 -> 15 avoids every hole on the 4x4 map.
    let path = [
        r#"{"action": 1}"#,
        r#"{"action": 1}"#,
        r#"{"action": 2}"#,
        r#"{"action": 1}"#,
        r#"{"action": 2}"#,
        r#"{"action": 2}"#,
    ];
    let mut last = Value::Null;
    for body in path {
        let (status, json) = send(&app, post("/step", body)).await;
        assert_eq!(status, StatusCode::OK);
        last = json;
    }

    assert_eq!(last["state"], 15);
    assert_eq!(last["done"], true);
    assert!((last["reward"].as_f64().unwrap() - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn frozen_lake_rejects_action_four() {
    let app = make_app(TaskKind::FrozenLake);
    let (status, json) = send(&app, post("/step", r#"{"action": 4}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid action");
}

#[tokio::test]
async fn reset_discards_previous_episode() {
    let app = make_app(TaskKind::FrozenLake);
    send(&app, post("/reset", "{}")).await;
    send(&app, post("/step", r#"{"action": 2}"#)).await;
    send(&app, post("/step", r#"{"action": 2}"#)).await;

    let (_, json) = send(&app, post("/reset", "{}")).await;
    assert_eq!(json["state"], 0);

    let (_, info) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(info["episode_steps"], 0);
}

#[tokio::test]
async fn step_after_reset_starts_from_the_initial_state() {
    let app = make_app(TaskKind::FrozenLake);
    send(&app, post("/reset", "{}")).await;

    // Down then Right drops the agent into the hole at 5.
    send(&app, post("/step", r#"{"action": 1}"#)).await;
    let (_, json) = send(&app, post("/step", r#"{"action": 2}"#)).await;
    assert_eq!(json["state"], 5);
    assert_eq!(json["done"], true);

    send(&app, post("/reset", "{}")).await;
    let (status, json) = send(&app, post("/step", r#"{"action": 1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], 4);
    assert_eq!(json["done"], false);
    assert_eq!(json["truncated"], false);
    assert!(json["reward"].as_f64().unwrap().abs() < f64::EPSILON);
}

#[tokio::test]
async fn array_body_does_not_step_the_simulation() {
    let app = make_app(TaskKind::CartPole);
    send(&app, post("/reset", "{}")).await;

    let (status, json) = send(&app, post("/step", "[1]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Malformed request body");

    let (_, info) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(info["episode_steps"], 0);
}

// =========================================================================
// Request validation
// =========================================================================

#[tokio::test]
async fn missing_action_is_bad_request() {
    let app = make_app(TaskKind::CartPole);
    for body in ["{}", r#"{"action": null}"#, r#"{"other": 1}"#] {
        let (status, json) = send(&app, post("/step", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(json["error"], "Action is required");
        assert_eq!(json["status"], 400);
    }
}

#[tokio::test]
async fn non_integer_action_is_bad_request() {
    let app = make_app(TaskKind::FrozenLake);
    for body in [r#"{"action": "left"}"#, r#"{"action": 1.5}"#, r#"{"action": [1]}"#] {
        let (status, json) = send(&app, post("/step", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(json["error"], "Invalid action");
    }
}

#[tokio::test]
async fn non_json_body_is_bad_request() {
    let app = make_app(TaskKind::CartPole);
    for body in ["", "action=1", "not json", "[1]", "[]", "1"] {
        let (status, json) = send(&app, post("/step", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(json["error"], "Malformed request body");
    }
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = make_app(TaskKind::CartPole);
    let response = app
        .oneshot(Request::get("/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_step_is_method_not_allowed() {
    let app = make_app(TaskKind::CartPole);
    let response = app
        .oneshot(Request::get("/step").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =========================================================================
// Info and CORS
// =========================================================================

#[tokio::test]
async fn info_describes_task() {
    let app = make_app(TaskKind::FrozenLake);
    let (status, json) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["task"], "frozen_lake");
    assert_eq!(
        json["actions"],
        serde_json::json!(["Left", "Down", "Right", "Up"])
    );
    assert_eq!(json["observation"]["discrete"]["states"], 16);
    assert_eq!(json["max_episode_steps"], 100);
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let app = make_app(TaskKind::CartPole);
    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/step")
                .header("origin", "http://localhost:3000")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    let origin = response
        .headers()
        .get("access-control-allow-origin")
        .unwrap();
    assert_eq!(origin, "*");
}

#[tokio::test]
async fn cors_header_on_simple_request() {
    let app = make_app(TaskKind::CartPole);
    let response = app
        .oneshot(
            Request::post("/reset")
                .header("origin", "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

// =========================================================================
// Internal failures
// =========================================================================

/// Environment whose renderer always fails.
#[derive(Debug)]
struct BlindEnvironment;

impl Environment for BlindEnvironment {
    fn task(&self) -> TaskKind {
        TaskKind::CartPole
    }

    fn action_labels(&self) -> &'static [&'static str] {
        &["Left", "Right"]
    }

    fn observation_kind(&self) -> ObservationKind {
        ObservationKind::Continuous { len: 4 }
    }

    fn max_episode_steps(&self) -> u32 {
        500
    }

    fn reset(&mut self) -> Result<Observation, SimError> {
        Ok(Observation::Continuous(vec![0.0; 4]))
    }

    fn step(&mut self, _action: usize) -> Result<Transition, SimError> {
        Ok(Transition {
            observation: Observation::Continuous(vec![0.0; 4]),
            reward: 1.0,
            terminated: false,
            truncated: false,
        })
    }

    fn render(&self) -> Result<Frame, SimError> {
        Err(SimError::Render(String::from("display unavailable")))
    }
}

#[tokio::test]
async fn simulation_failure_is_opaque_500() {
    let state = AppState::new(Session::new(Box::new(BlindEnvironment)));
    let app = build_router(Arc::new(state));

    for request in [post("/reset", "{}"), post("/step", r#"{"action": 0}"#)] {
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal Server Error");
        assert_eq!(json["status"], 500);
        assert!(!json.to_string().contains("display unavailable"));
    }
}

#[tokio::test]
async fn invalid_action_is_checked_before_the_environment() {
    let state = AppState::new(Session::new(Box::new(BlindEnvironment)));
    let app = build_router(Arc::new(state));

    let (status, _) = send(&app, post("/step", r#"{"action": 9}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
