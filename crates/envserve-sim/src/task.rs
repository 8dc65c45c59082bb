//! Task selection and per-task settings.
//!
//! These structs deserialize from the `task` section of the service
//! configuration file. Every field has a default so an empty section
//! yields the default cart-pole task.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Which simulated task a service hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Pole balancing on a moving cart.
    #[default]
    #[serde(alias = "cartpole")]
    CartPole,
    /// Grid navigation across a frozen lake with holes.
    #[serde(alias = "frozenlake")]
    FrozenLake,
}

impl TaskKind {
    /// Stable snake-case name of the task.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CartPole => "cart_pole",
            Self::FrozenLake => "frozen_lake",
        }
    }

    /// Port the task's service listens on when none is configured.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::FrozenLake => 8000,
            Self::CartPole => 8001,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cart_pole" | "cartpole" | "cart-pole" => Ok(Self::CartPole),
            "frozen_lake" | "frozenlake" | "frozen-lake" => Ok(Self::FrozenLake),
            other => Err(SimError::Config(format!("unknown task: {other}"))),
        }
    }
}

/// Built-in frozen-lake layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum MapName {
    /// The 4x4 layout.
    #[serde(rename = "4x4")]
    Small,
    /// The 8x8 layout.
    #[default]
    #[serde(rename = "8x8")]
    Large,
}

/// Settings specific to the frozen-lake task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrozenLakeConfig {
    /// Which built-in layout to load.
    #[serde(default)]
    pub map: MapName,

    /// Custom layout rows of `S`, `F`, `H` and `G` tiles. Takes precedence
    /// over `map` when present.
    #[serde(default)]
    pub desc: Option<Vec<String>>,

    /// Whether moves may slide perpendicular to the requested direction.
    #[serde(default = "default_slippery")]
    pub slippery: bool,
}

impl Default for FrozenLakeConfig {
    fn default() -> Self {
        Self {
            map: MapName::default(),
            desc: None,
            slippery: default_slippery(),
        }
    }
}

const fn default_slippery() -> bool {
    true
}

/// Task section of the service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskConfig {
    /// Which task to host.
    #[serde(default)]
    pub kind: TaskKind,

    /// Seed for the task's random stream. Seeded from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Episode horizon. Uses the task's own horizon when absent.
    #[serde(default)]
    pub max_episode_steps: Option<u32>,

    /// Frozen-lake settings (ignored by other tasks).
    #[serde(default)]
    pub frozen_lake: FrozenLakeConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_defaults_to_cart_pole() {
        let config: TaskConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config.kind, TaskKind::CartPole);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_episode_steps, None);
        assert_eq!(config.frozen_lake.map, MapName::Large);
        assert_eq!(config.frozen_lake.desc, None);
        assert!(config.frozen_lake.slippery);
    }

    #[test]
    fn parses_frozen_lake_section() {
        let yaml = r#"
kind: frozen_lake
seed: 7
max_episode_steps: 50
frozen_lake:
  map: "4x4"
  slippery: false
"#;
        let config: TaskConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.kind, TaskKind::FrozenLake);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_episode_steps, Some(50));
        assert_eq!(config.frozen_lake.map, MapName::Small);
        assert!(!config.frozen_lake.slippery);
    }

    #[test]
    fn parses_custom_layout() {
        let yaml = r#"
kind: frozen_lake
frozen_lake:
  desc: ["SF", "HG"]
"#;
        let config: TaskConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            config.frozen_lake.desc,
            Some(vec![String::from("SF"), String::from("HG")])
        );
    }

    #[test]
    fn task_kind_accepts_aliases() {
        let config: TaskConfig = serde_yml::from_str("kind: frozenlake").unwrap();
        assert_eq!(config.kind, TaskKind::FrozenLake);

        assert_eq!("CartPole".parse::<TaskKind>().unwrap(), TaskKind::CartPole);
        assert_eq!("frozen-lake".parse::<TaskKind>().unwrap(), TaskKind::FrozenLake);
        assert!(matches!(
            "lunar_lander".parse::<TaskKind>(),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn default_ports_differ_per_task() {
        assert_eq!(TaskKind::FrozenLake.default_port(), 8000);
        assert_eq!(TaskKind::CartPole.default_port(), 8001);
        assert_eq!(TaskKind::FrozenLake.to_string(), "frozen_lake");
    }
}
