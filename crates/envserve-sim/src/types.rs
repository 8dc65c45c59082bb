//! Values exchanged across the simulation boundary.

use serde::Serialize;

/// The externally visible state summary returned after reset and step.
///
/// Serializes untagged: a continuous observation becomes a JSON array and
/// a discrete one a bare integer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Observation {
    /// A fixed-length vector of real values (cart-pole).
    Continuous(Vec<f32>),
    /// A single state index (frozen lake: `row * ncol + col`).
    Discrete(u32),
}

#[cfg(test)]
impl Observation {
    /// The observation as a continuous vector, if it is one.
    pub(crate) fn as_continuous(&self) -> Option<&[f32]> {
        match self {
            Self::Continuous(values) => Some(values),
            Self::Discrete(_) => None,
        }
    }

    /// The observation as a discrete index, if it is one.
    pub(crate) const fn as_discrete(&self) -> Option<u32> {
        match self {
            Self::Continuous(_) => None,
            Self::Discrete(index) => Some(*index),
        }
    }
}

/// Shape of the observations a task produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// A vector of the given length.
    Continuous {
        /// Number of components.
        len: usize,
    },
    /// An index into `0..states`.
    Discrete {
        /// Number of distinct states.
        states: u32,
    },
}

/// Outcome of advancing a task by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation after the step.
    pub observation: Observation,
    /// Reward earned by the step.
    pub reward: f64,
    /// The episode reached a terminal state.
    pub terminated: bool,
    /// The episode reached its step horizon.
    pub truncated: bool,
}
