//! Frozen-lake grid navigation task.
//!
//! The agent starts on `S` and walks the grid toward `G`. Entering `H`
//! (a hole) or `G` ends the episode; only the goal pays a reward. On a
//! slippery lake the executed move is the requested one or either
//! perpendicular one with equal probability.
//!
//! Observations are the flat index `row * ncol + col`.

use plotters::element::{Circle, PathElement, Rectangle};
use plotters::style::Color as _;
use rand::Rng;
use rand::rngs::StdRng;

use crate::canvas::{Color, Frame, draw_error, pixels, point, rgb};
use crate::environment::{Environment, action_as_i64};
use crate::error::SimError;
use crate::task::{FrozenLakeConfig, MapName, TaskKind};
use crate::types::{Observation, ObservationKind, Transition};

const MAP_4X4: &[&str] = &["SFFF", "FHFH", "FFFH", "HFFG"];

const MAP_8X8: &[&str] = &[
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF",
    "FFFHFFFG",
];

const DEFAULT_MAX_EPISODE_STEPS: u32 = 100;
const ACTION_LABELS: &[&str] = &["Left", "Down", "Right", "Up"];

const CELL_SIZE: u32 = 64;
const MAX_WINDOW: u32 = 512;

const ICE: Color = [180, 220, 240];
const START: Color = [205, 232, 248];
const HOLE: Color = [22, 42, 92];
const CRACKED_HOLE: Color = [96, 32, 44];
const GOAL: Color = [238, 196, 48];
const GRID_LINE: Color = [120, 152, 184];
const AGENT: Color = [204, 36, 36];
const HEADING: Color = [255, 255, 255];

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tile {
    Start,
    Frozen,
    Hole,
    Goal,
}

impl Tile {
    fn parse(c: char) -> Option<Self> {
        match c {
            'S' => Some(Self::Start),
            'F' => Some(Self::Frozen),
            'H' => Some(Self::Hole),
            'G' => Some(Self::Goal),
            _ => None,
        }
    }

    const fn is_terminal(self) -> bool {
        matches!(self, Self::Hole | Self::Goal)
    }
}

/// Move directions, in action order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Down,
    Right,
    Up,
}

impl Direction {
    const ALL: [Self; 4] = [Self::Left, Self::Down, Self::Right, Self::Up];

    fn from_action(action: usize) -> Option<Self> {
        Self::ALL.get(action).copied()
    }

    /// The direction a quarter turn counter-clockwise in action order.
    const fn before(self) -> Self {
        match self {
            Self::Left => Self::Up,
            Self::Down => Self::Left,
            Self::Right => Self::Down,
            Self::Up => Self::Right,
        }
    }

    const fn after(self) -> Self {
        match self {
            Self::Left => Self::Down,
            Self::Down => Self::Right,
            Self::Right => Self::Up,
            Self::Up => Self::Left,
        }
    }
}

/// A validated rectangular layout.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Grid {
    tiles: Vec<Tile>,
    nrow: u32,
    ncol: u32,
    start: (u32, u32),
}

impl Grid {
    fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, SimError> {
        let nrow = u32::try_from(rows.len())
            .map_err(|e| SimError::Config(format!("frozen-lake layout is too tall: {e}")))?;
        if nrow == 0 {
            return Err(SimError::Config(String::from("frozen-lake layout is empty")));
        }

        let mut tiles = Vec::new();
        let mut ncol: Option<u32> = None;
        let mut start = None;
        for (row, line) in (0..nrow).zip(rows) {
            let line = line.as_ref().trim();
            let mut width: u32 = 0;
            for c in line.chars() {
                let tile = Tile::parse(c).ok_or_else(|| {
                    SimError::Config(format!("unknown frozen-lake tile {c:?} in row {row}"))
                })?;
                if tile == Tile::Start {
                    if start.is_some() {
                        return Err(SimError::Config(String::from(
                            "frozen-lake layout has more than one start tile",
                        )));
                    }
                    start = Some((row, width));
                }
                tiles.push(tile);
                width = width.saturating_add(1);
            }
            match ncol {
                None if width == 0 => {
                    return Err(SimError::Config(String::from(
                        "frozen-lake layout has an empty row",
                    )));
                }
                None => ncol = Some(width),
                Some(expected) if expected != width => {
                    return Err(SimError::Config(format!(
                        "frozen-lake row {row} has {width} tiles, expected {expected}"
                    )));
                }
                Some(_) => {}
            }
        }

        let start = start
            .ok_or_else(|| SimError::Config(String::from("frozen-lake layout has no start tile")))?;
        Ok(Self {
            tiles,
            nrow,
            ncol: ncol.unwrap_or(0),
            start,
        })
    }

    fn state_count(&self) -> u32 {
        self.nrow.saturating_mul(self.ncol)
    }

    fn index(&self, (row, col): (u32, u32)) -> u32 {
        row.saturating_mul(self.ncol).saturating_add(col)
    }

    fn tile(&self, position: (u32, u32)) -> Result<Tile, SimError> {
        let (row, col) = position;
        if row >= self.nrow || col >= self.ncol {
            return Err(SimError::InvalidState(format!(
                "agent at ({row}, {col}) is outside the {}x{} lake",
                self.nrow, self.ncol
            )));
        }
        usize::try_from(self.index(position))
            .ok()
            .and_then(|i| self.tiles.get(i).copied())
            .ok_or_else(|| {
                SimError::InvalidState(format!("no tile stored for ({row}, {col})"))
            })
    }

    /// The cell reached by moving one step, clamped at the edges.
    fn neighbor(&self, (row, col): (u32, u32), direction: Direction) -> (u32, u32) {
        let last_row = self.nrow.saturating_sub(1);
        let last_col = self.ncol.saturating_sub(1);
        match direction {
            Direction::Left => (row, col.saturating_sub(1)),
            Direction::Down => (row.saturating_add(1).min(last_row), col),
            Direction::Right => (row, col.saturating_add(1).min(last_col)),
            Direction::Up => (row.saturating_sub(1), col),
        }
    }
}

/// The frozen-lake task.
#[derive(Debug)]
pub struct FrozenLake {
    grid: Grid,
    position: (u32, u32),
    last_direction: Option<Direction>,
    slippery: bool,
    rng: StdRng,
    elapsed_steps: u32,
    max_episode_steps: u32,
}

impl FrozenLake {
    /// Create the task with the agent on the start tile.
    ///
    /// `max_episode_steps` defaults to 100 when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if a custom layout is malformed.
    pub fn new(
        config: &FrozenLakeConfig,
        rng: StdRng,
        max_episode_steps: Option<u32>,
    ) -> Result<Self, SimError> {
        let grid = match &config.desc {
            Some(rows) => Grid::parse(rows.as_slice())?,
            None => Grid::parse(match config.map {
                MapName::Small => MAP_4X4,
                MapName::Large => MAP_8X8,
            })?,
        };
        Ok(Self {
            position: grid.start,
            grid,
            last_direction: None,
            slippery: config.slippery,
            rng,
            elapsed_steps: 0,
            max_episode_steps: max_episode_steps.unwrap_or(DEFAULT_MAX_EPISODE_STEPS),
        })
    }

    fn observation(&self) -> Observation {
        Observation::Discrete(self.grid.index(self.position))
    }

    fn executed_direction(&mut self, intended: Direction) -> Direction {
        if !self.slippery {
            return intended;
        }
        match self.rng.random_range(0..3_u8) {
            0 => intended.before(),
            1 => intended,
            _ => intended.after(),
        }
    }

    fn window_size(&self) -> (u32, u32) {
        (
            self.grid.ncol.saturating_mul(CELL_SIZE).min(MAX_WINDOW),
            self.grid.nrow.saturating_mul(CELL_SIZE).min(MAX_WINDOW),
        )
    }
}

impl Environment for FrozenLake {
    fn task(&self) -> TaskKind {
        TaskKind::FrozenLake
    }

    fn action_labels(&self) -> &'static [&'static str] {
        ACTION_LABELS
    }

    fn observation_kind(&self) -> ObservationKind {
        ObservationKind::Discrete {
            states: self.grid.state_count(),
        }
    }

    fn max_episode_steps(&self) -> u32 {
        self.max_episode_steps
    }

    fn reset(&mut self) -> Result<Observation, SimError> {
        self.position = self.grid.start;
        self.last_direction = None;
        self.elapsed_steps = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Transition, SimError> {
        let intended = Direction::from_action(action).ok_or(SimError::InvalidAction {
            action: action_as_i64(action),
            actions: ACTION_LABELS.len(),
        })?;

        let current = self.grid.tile(self.position)?;
        let (reward, terminated) = if current.is_terminal() {
            // Terminal tiles absorb every move.
            (0.0, true)
        } else {
            let direction = self.executed_direction(intended);
            let next = self.grid.neighbor(self.position, direction);
            let tile = self.grid.tile(next)?;
            self.position = next;
            let reward = if tile == Tile::Goal { 1.0 } else { 0.0 };
            (reward, tile.is_terminal())
        };

        self.last_direction = Some(intended);
        self.elapsed_steps = self.elapsed_steps.saturating_add(1);

        Ok(Transition {
            observation: self.observation(),
            reward,
            terminated,
            truncated: self.elapsed_steps >= self.max_episode_steps,
        })
    }

    fn render(&self) -> Result<Frame, SimError> {
        let (width, height) = self.window_size();
        let mut frame = Frame::new(width, height, ICE)?;
        let cell_w = f64::from(width) / f64::from(self.grid.ncol);
        let cell_h = f64::from(height) / f64::from(self.grid.nrow);
        let right = f64::from(width) - 1.0;
        let bottom = f64::from(height) - 1.0;
        let agent_tile = self.grid.tile(self.position)?;

        frame.draw(|area| {
            for row in 0..self.grid.nrow {
                for col in 0..self.grid.ncol {
                    let left = f64::from(col) * cell_w;
                    let top = f64::from(row) * cell_h;
                    let color = match self.grid.tile((row, col))? {
                        Tile::Start => START,
                        Tile::Frozen => ICE,
                        Tile::Hole if (row, col) == self.position => CRACKED_HOLE,
                        Tile::Hole => HOLE,
                        Tile::Goal => GOAL,
                    };
                    area.draw(&Rectangle::new(
                        [point(left, top), point(left + cell_w, top + cell_h)],
                        rgb(color).filled(),
                    ))
                    .map_err(draw_error)?;
                }
            }

            // Grid lines, with the far edges pulled inside the frame.
            for col in 0..=self.grid.ncol {
                let x = (f64::from(col) * cell_w).min(right);
                area.draw(&PathElement::new(
                    vec![point(x, 0.0), point(x, bottom)],
                    rgb(GRID_LINE).stroke_width(1),
                ))
                .map_err(draw_error)?;
            }
            for row in 0..=self.grid.nrow {
                let y = (f64::from(row) * cell_h).min(bottom);
                area.draw(&PathElement::new(
                    vec![point(0.0, y), point(right, y)],
                    rgb(GRID_LINE).stroke_width(1),
                ))
                .map_err(draw_error)?;
            }

            if agent_tile == Tile::Hole {
                return Ok(());
            }
            let (row, col) = self.position;
            let cx = (f64::from(col) + 0.5) * cell_w;
            let cy = (f64::from(row) + 0.5) * cell_h;
            let radius = cell_w.min(cell_h) * 0.3;
            area.draw(&Circle::new(
                point(cx, cy),
                pixels(radius),
                rgb(AGENT).filled(),
            ))
            .map_err(draw_error)?;

            if let Some(direction) = self.last_direction {
                let (dx, dy): (f64, f64) = match direction {
                    Direction::Left => (-1.0, 0.0),
                    Direction::Down => (0.0, 1.0),
                    Direction::Right => (1.0, 0.0),
                    Direction::Up => (0.0, -1.0),
                };
                let reach = radius * 0.55;
                area.draw(&Circle::new(
                    point(dx.mul_add(reach, cx), dy.mul_add(reach, cy)),
                    pixels(radius * 0.25),
                    rgb(HEADING).filled(),
                ))
                .map_err(draw_error)?;
            }
            Ok(())
        })?;

        Ok(frame)
    }
}
