//! Error types for the service binary.
//!
//! [`ServiceError`] wraps every failure that can stop the service during
//! startup or while serving.

use envserve_api::{ConfigError, ServerError};
use envserve_sim::SimError;

/// Top-level error for the service binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The configured task could not be built or reset.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimError,
    },

    /// The HTTP server failed to bind or crashed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}
