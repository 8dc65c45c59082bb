//! HTTP endpoint handlers for the environment API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Describe the hosted task and current episode |
//! | `POST` | `/reset` | Start a new episode |
//! | `POST` | `/step` | Advance the episode with `{"action": n}` |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use envserve_sim::{Observation, encode_base64_png};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, SessionInfo};

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// Response of `POST /reset`.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    /// Initial observation.
    pub state: Observation,
    /// Base64-encoded PNG of the initial state.
    pub image: String,
}

/// Response of `POST /step`.
#[derive(Debug, Serialize)]
pub struct StepResponse {
    /// Observation after the step.
    pub state: Observation,
    /// Reward earned by the step.
    pub reward: f64,
    /// The episode reached a terminal state.
    pub done: bool,
    /// The episode reached its step horizon.
    pub truncated: bool,
    /// Base64-encoded PNG of the state after the step.
    pub image: String,
    /// Label of the action taken.
    #[serde(rename = "move")]
    pub move_label: &'static str,
}

/// Extract the action from a raw step body.
///
/// # Errors
///
/// Returns [`ApiError::MalformedBody`] if the body is not a JSON object,
/// [`ApiError::MissingAction`] if `action` is absent or `null`, and
/// [`ApiError::InvalidAction`] if it is not an integer.
pub fn parse_action(body: &[u8]) -> Result<i64, ApiError> {
    let request: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    let fields = request.as_object().ok_or_else(|| {
        ApiError::MalformedBody(format!("expected a JSON object, got {request}"))
    })?;
    let value = fields
        .get("action")
        .filter(|value| !value.is_null())
        .ok_or(ApiError::MissingAction)?;
    value
        .as_i64()
        .ok_or_else(|| ApiError::InvalidAction(format!("expected an integer, got {value}")))
}

// ---------------------------------------------------------------------------
// GET / -- service description
// ---------------------------------------------------------------------------

/// Describe the hosted task, its actions, and the current episode.
pub async fn info(State(state): State<Arc<AppState>>) -> Json<SessionInfo> {
    let info = state.session.lock().await.describe();
    Json(info)
}

// ---------------------------------------------------------------------------
// POST /reset
// ---------------------------------------------------------------------------

/// Reset the simulation and return its initial observation and frame.
pub async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<ResetResponse>, ApiError> {
    info!(task = %state.task, "resetting environment");

    let snapshot = state.session.lock().await.reset()?;
    info!(state = ?snapshot.observation, "environment reset");

    let image = encode_base64_png(&snapshot.frame)?;
    Ok(Json(ResetResponse {
        state: snapshot.observation,
        image,
    }))
}

// ---------------------------------------------------------------------------
// POST /step
// ---------------------------------------------------------------------------

/// Apply one action and return the resulting observation, reward, flags,
/// move label, and frame.
pub async fn step(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<StepResponse>, ApiError> {
    let action = parse_action(&body)?;
    info!(task = %state.task, action, "action received");

    let outcome = state.session.lock().await.step(action)?;
    let transition = outcome.transition;
    info!(
        state = ?transition.observation,
        reward = transition.reward,
        done = transition.terminated,
        truncated = transition.truncated,
        action_label = outcome.label,
        "step result"
    );

    let image = encode_base64_png(&outcome.frame)?;
    Ok(Json(StepResponse {
        state: transition.observation,
        reward: transition.reward,
        done: transition.terminated,
        truncated: transition.truncated,
        image,
        move_label: outcome.label,
    }))
}
