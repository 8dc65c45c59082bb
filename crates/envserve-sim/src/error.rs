//! Error types for the `envserve-sim` crate.
//!
//! Every fallible call across the simulation boundary returns [`SimError`],
//! so callers can tell a bad action apart from a renderer or encoder
//! failure without inspecting message strings.

/// Errors that can occur while stepping, rendering, or encoding a task.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The action index is outside the task's discrete action set.
    #[error("invalid action {action}: expected 0..{actions}")]
    InvalidAction {
        /// The action that was requested.
        action: i64,
        /// Number of actions the task accepts.
        actions: usize,
    },

    /// The simulation reached a state it cannot continue from.
    #[error("invalid simulation state: {0}")]
    InvalidState(String),

    /// The renderer could not produce a frame.
    #[error("render failed: {0}")]
    Render(String),

    /// The frame could not be encoded as PNG.
    #[error("frame encoding failed: {source}")]
    Encode {
        /// The underlying image codec error.
        #[from]
        source: image::ImageError,
    },

    /// The task configuration is not usable.
    #[error("invalid task configuration: {0}")]
    Config(String),
}

impl SimError {
    /// Whether the error was caused by the caller's input rather than the
    /// simulation itself.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAction { .. })
    }
}
