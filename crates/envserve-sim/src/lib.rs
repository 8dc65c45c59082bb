//! Simulated control tasks served by the envserve HTTP services.
//!
//! This crate owns everything behind the simulation boundary: the task
//! dynamics, the raster renderer, and the PNG/base64 encoding used to ship
//! frames to callers. The HTTP layer only sees the [`Environment`] trait and
//! [`SimError`].
//!
//! # Modules
//!
//! - [`environment`] -- The [`Environment`] trait, action validation, and
//!   [`build_environment`] for the configured task.
//! - [`cart_pole`] -- Pole balancing with Euler-integrated dynamics.
//! - [`frozen_lake`] -- Grid navigation with optional slippery moves.
//! - [`canvas`] -- [`Frame`] raster with fill primitives.
//! - [`encode`] -- PNG and base64 frame encoding.
//! - [`task`] -- Task selection settings read from configuration.
//! - [`types`] -- [`Observation`] and [`Transition`].
//! - [`error`] -- [`SimError`].

pub mod canvas;
pub mod cart_pole;
pub mod encode;
pub mod environment;
pub mod error;
pub mod frozen_lake;
pub mod task;
pub mod types;

// Re-export primary types at crate root.
pub use canvas::Frame;
pub use encode::{encode_base64_png, encode_png};
pub use environment::{Environment, build_environment, check_action};
pub use error::SimError;
pub use task::{FrozenLakeConfig, MapName, TaskConfig, TaskKind};
pub use types::{Observation, ObservationKind, Transition};
