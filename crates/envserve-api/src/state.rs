//! Shared application state for the environment API.
//!
//! [`Session`] owns the process's single simulation instance and its
//! episode bookkeeping. [`AppState`] wraps the session in an async mutex
//! and is injected into every handler through Axum's `State` extractor,
//! so no request ever reaches the simulation through a global.

use std::sync::Arc;

use envserve_sim::{
    Environment, Frame, Observation, ObservationKind, SimError, TaskKind, Transition,
    check_action,
};
use serde::Serialize;
use tokio::sync::Mutex;

/// Observation and frame right after a reset.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Initial observation of the new episode.
    pub observation: Observation,
    /// Rendering of the initial state.
    pub frame: Frame,
}

/// Everything a single step produced.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Observation, reward and episode flags.
    pub transition: Transition,
    /// Human-readable label of the action taken.
    pub label: &'static str,
    /// Rendering of the state after the step.
    pub frame: Frame,
}

/// Read-only description of the running session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// The hosted task.
    pub task: TaskKind,
    /// Action labels, indexed by action.
    pub actions: &'static [&'static str],
    /// Shape of the observations returned by reset and step.
    pub observation: ObservationKind,
    /// Step count at which episodes are truncated.
    pub max_episode_steps: u32,
    /// Number of resets performed since startup.
    pub episode: u64,
    /// Steps taken since the last reset.
    pub episode_steps: u32,
}

/// The process's simulation instance plus episode bookkeeping.
///
/// Every operation validates input before touching the environment, then
/// renders the resulting state so callers always get a frame that matches
/// the observation.
#[derive(Debug)]
pub struct Session {
    env: Box<dyn Environment>,
    episode: u64,
    episode_steps: u32,
}

impl Session {
    /// Wrap an already-built environment.
    pub fn new(env: Box<dyn Environment>) -> Self {
        Self {
            env,
            episode: 0,
            episode_steps: 0,
        }
    }

    /// Restart the episode and render its first frame.
    ///
    /// # Errors
    ///
    /// Returns the environment's [`SimError`] if resetting or rendering
    /// fails.
    pub fn reset(&mut self) -> Result<Snapshot, SimError> {
        let observation = self.env.reset()?;
        self.episode = self.episode.saturating_add(1);
        self.episode_steps = 0;
        let frame = self.env.render()?;
        Ok(Snapshot { observation, frame })
    }

    /// Validate `action`, advance the environment, and render the result.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidAction`] without touching the
    /// environment when `action` is outside the task's action set, or the
    /// environment's error if stepping or rendering fails.
    pub fn step(&mut self, action: i64) -> Result<StepOutcome, SimError> {
        let actions = self.env.action_labels();
        let index = check_action(action, actions.len())?;
        let label = actions
            .get(index)
            .copied()
            .ok_or(SimError::InvalidAction {
                action,
                actions: actions.len(),
            })?;

        let transition = self.env.step(index)?;
        self.episode_steps = self.episode_steps.saturating_add(1);
        let frame = self.env.render()?;
        Ok(StepOutcome {
            transition,
            label,
            frame,
        })
    }

    /// Describe the task and current episode.
    pub fn describe(&self) -> SessionInfo {
        SessionInfo {
            task: self.env.task(),
            actions: self.env.action_labels(),
            observation: self.env.observation_kind(),
            max_episode_steps: self.env.max_episode_steps(),
            episode: self.episode,
            episode_steps: self.episode_steps,
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// mutex makes each request's step-and-render atomic; callers still share
/// one instance with no isolation from each other.
#[derive(Clone)]
pub struct AppState {
    /// The hosted task.
    pub task: TaskKind,
    /// The single simulation session.
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    /// Create the application state around an existing session.
    pub fn new(session: Session) -> Self {
        let task = session.describe().task;
        Self {
            task,
            session: Arc::new(Mutex::new(session)),
        }
    }
}
