//! HTTP API over a single in-process simulated environment.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`POST /reset`** -- restart the episode; returns the initial
//!   observation and a base64-encoded PNG frame
//! - **`POST /step`** -- apply `{"action": n}`; returns the observation,
//!   reward, `done`/`truncated` flags, the move label, and a frame
//! - **`GET /`** -- a JSON description of the hosted task
//!
//! # Architecture
//!
//! One [`Session`] owns the process's only simulation instance. It is
//! built at startup, wrapped in [`AppState`], and handed to every handler
//! through the router state. Requests share and mutate the same instance;
//! the mutex only keeps each step-and-render atomic.
//!
//! Input errors map to `400`; every failure behind the simulation boundary
//! is logged by kind and returned as an opaque `500` (see [`ApiError`]).
//!
//! [`Session`]: state::Session
//! [`AppState`]: state::AppState
//! [`ApiError`]: error::ApiError

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, Session};
