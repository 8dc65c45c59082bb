//! Error types for the environment API.
//!
//! [`ApiError`] unifies request validation failures and simulation
//! failures into a single enum that converts into an Axum HTTP response
//! via its [`IntoResponse`](axum::response::IntoResponse) implementation.
//! Client mistakes become `400` with a short message; everything raised
//! behind the simulation boundary becomes an opaque `500` after being
//! logged with its kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use envserve_sim::SimError;
use tracing::{error, warn};

/// Message returned for every internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Errors that can occur while handling an API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The step request carried no `action`.
    #[error("action is required")]
    MissingAction,

    /// The `action` was present but not a usable integer.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// The request body was not a JSON object.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// The simulation, renderer, or encoder failed.
    #[error(transparent)]
    Simulation(#[from] SimError),
}

impl ApiError {
    /// HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingAction | Self::InvalidAction(_) | Self::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Simulation(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Simulation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Short label for the kind of simulation failure, used in logs.
const fn failure_kind(error: &SimError) -> &'static str {
    match error {
        SimError::InvalidAction { .. } => "invalid_action",
        SimError::InvalidState(_) => "invalid_state",
        SimError::Render(_) => "render",
        SimError::Encode { .. } => "encode",
        SimError::Config(_) => "config",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::MissingAction => String::from("Action is required"),
            Self::InvalidAction(detail) => {
                warn!(detail = %detail, "rejected action");
                String::from("Invalid action")
            }
            Self::MalformedBody(detail) => {
                warn!(detail = %detail, "rejected request body");
                String::from("Malformed request body")
            }
            Self::Simulation(e) if e.is_client_error() => {
                warn!(error = %e, "rejected action");
                String::from("Invalid action")
            }
            Self::Simulation(e) => {
                error!(kind = failure_kind(e), error = %e, "simulation request failed");
                String::from(INTERNAL_ERROR_MESSAGE)
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
