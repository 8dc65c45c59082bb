//! The [`Environment`] trait every hosted task implements, and the factory
//! that builds the configured task.

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::canvas::Frame;
use crate::cart_pole::CartPole;
use crate::error::SimError;
use crate::frozen_lake::FrozenLake;
use crate::task::{TaskConfig, TaskKind};
use crate::types::{Observation, ObservationKind, Transition};

/// A stateful simulated task with a discrete action set.
///
/// Implementations keep their own episode bookkeeping (step horizon,
/// terminal flags) and must reject out-of-range actions with
/// [`SimError::InvalidAction`] rather than panicking.
pub trait Environment: Send + fmt::Debug {
    /// Which task this is.
    fn task(&self) -> TaskKind;

    /// Human-readable label for each action, indexed by action.
    fn action_labels(&self) -> &'static [&'static str];

    /// Number of discrete actions.
    fn action_count(&self) -> usize {
        self.action_labels().len()
    }

    /// Shape of the observations this task produces.
    fn observation_kind(&self) -> ObservationKind;

    /// Step count at which an episode is truncated.
    fn max_episode_steps(&self) -> u32;

    /// Restart the episode from the task's initial-state distribution.
    fn reset(&mut self) -> Result<Observation, SimError>;

    /// Advance the task by one tick.
    fn step(&mut self, action: usize) -> Result<Transition, SimError>;

    /// Draw the current state.
    fn render(&self) -> Result<Frame, SimError>;
}

/// Validate a raw action against a task with `actions` discrete moves.
///
/// # Errors
///
/// Returns [`SimError::InvalidAction`] if `action` is negative or not
/// below `actions`.
pub fn check_action(action: i64, actions: usize) -> Result<usize, SimError> {
    usize::try_from(action)
        .ok()
        .filter(|&index| index < actions)
        .ok_or(SimError::InvalidAction { action, actions })
}

/// Build the task described by `config`, already reset once.
///
/// # Errors
///
/// Returns [`SimError::Config`] if the configured horizon is zero or a
/// custom frozen-lake layout is malformed.
pub fn build_environment(config: &TaskConfig) -> Result<Box<dyn Environment>, SimError> {
    if config.max_episode_steps == Some(0) {
        return Err(SimError::Config(String::from(
            "max_episode_steps must be at least 1",
        )));
    }

    let rng = seeded_rng(config.seed);
    let env: Box<dyn Environment> = match config.kind {
        TaskKind::CartPole => Box::new(CartPole::new(rng, config.max_episode_steps)),
        TaskKind::FrozenLake => Box::new(FrozenLake::new(
            &config.frozen_lake,
            rng,
            config.max_episode_steps,
        )?),
    };

    info!(
        task = %env.task(),
        actions = env.action_count(),
        max_episode_steps = env.max_episode_steps(),
        seeded = config.seed.is_some(),
        "environment built"
    );
    Ok(env)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
}

/// Convert an in-range action index back to the signed form used in errors.
pub(crate) fn action_as_i64(action: usize) -> i64 {
    i64::try_from(action).unwrap_or(i64::MAX)
}
