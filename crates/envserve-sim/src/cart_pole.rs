//! Cart-pole balancing task.
//!
//! A pole is hinged to a cart on a frictionless track. Each step pushes
//! the cart left or right with a fixed force; the episode terminates once
//! the pole leans past 12 degrees or the cart leaves the track.
//!
//! # Dynamics
//!
//! ```text
//! temp      = (force + m_p * l * theta_dot^2 * sin(theta)) / (m_c + m_p)
//! theta_acc = (g * sin(theta) - cos(theta) * temp)
//!             / (l * (4/3 - m_p * cos^2(theta) / (m_c + m_p)))
//! x_acc     = temp - m_p * l * theta_acc * cos(theta) / (m_c + m_p)
//! ```
//!
//! integrated with explicit Euler at `tau = 0.02` s.

use plotters::element::{Circle, PathElement, Polygon, Rectangle};
use plotters::style::Color as _;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::warn;

use crate::canvas::{Color, Frame, draw_error, pixels, point, rgb};
use crate::environment::{Environment, action_as_i64};
use crate::error::SimError;
use crate::task::TaskKind;
use crate::types::{Observation, ObservationKind, Transition};

const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const TOTAL_MASS: f64 = MASS_CART + MASS_POLE;
/// Half the pole's length.
const POLE_HALF_LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = MASS_POLE * POLE_HALF_LENGTH;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02;

/// Pole angle beyond which the episode terminates (12 degrees).
const THETA_THRESHOLD: f64 = 12.0 * 2.0 * std::f64::consts::PI / 360.0;
/// Cart position beyond which the episode terminates.
const X_THRESHOLD: f64 = 2.4;
/// Bound of the uniform initial-state distribution.
const INIT_BOUND: f64 = 0.05;

const DEFAULT_MAX_EPISODE_STEPS: u32 = 500;
const ACTION_LABELS: &[&str] = &["Left", "Right"];

const SCREEN_WIDTH: u32 = 600;
const SCREEN_HEIGHT: u32 = 400;
const POLE_WIDTH: f64 = 10.0;
const CART_WIDTH: f64 = 50.0;
const CART_HEIGHT: f64 = 30.0;
/// Height of the track above the bottom edge.
const CART_Y: f64 = 100.0;

const WHITE: Color = [255, 255, 255];
const BLACK: Color = [0, 0, 0];
const POLE_COLOR: Color = [202, 152, 101];
const AXLE_COLOR: Color = [129, 132, 203];

/// Cart-pole state: `[x, x_dot, theta, theta_dot]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    x: f64,
    x_dot: f64,
    theta: f64,
    theta_dot: f64,
}

impl State {
    fn sample(rng: &mut StdRng) -> Self {
        Self {
            x: rng.random_range(-INIT_BOUND..INIT_BOUND),
            x_dot: rng.random_range(-INIT_BOUND..INIT_BOUND),
            theta: rng.random_range(-INIT_BOUND..INIT_BOUND),
            theta_dot: rng.random_range(-INIT_BOUND..INIT_BOUND),
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.x_dot.is_finite()
            && self.theta.is_finite()
            && self.theta_dot.is_finite()
    }

    fn is_terminal(&self) -> bool {
        self.x < -X_THRESHOLD
            || self.x > X_THRESHOLD
            || self.theta < -THETA_THRESHOLD
            || self.theta > THETA_THRESHOLD
    }

    #[allow(clippy::cast_possible_truncation)]
    fn observation(&self) -> Observation {
        Observation::Continuous(vec![
            self.x as f32,
            self.x_dot as f32,
            self.theta as f32,
            self.theta_dot as f32,
        ])
    }
}

/// The cart-pole task.
#[derive(Debug)]
pub struct CartPole {
    state: State,
    rng: StdRng,
    elapsed_steps: u32,
    max_episode_steps: u32,
    /// Steps taken since the episode terminated, if it has.
    steps_beyond_terminated: Option<u32>,
}

impl CartPole {
    /// Create the task and sample its first initial state.
    ///
    /// `max_episode_steps` defaults to 500 when `None`.
    pub fn new(mut rng: StdRng, max_episode_steps: Option<u32>) -> Self {
        let state = State::sample(&mut rng);
        Self {
            state,
            rng,
            elapsed_steps: 0,
            max_episode_steps: max_episode_steps.unwrap_or(DEFAULT_MAX_EPISODE_STEPS),
            steps_beyond_terminated: None,
        }
    }

    fn integrate(&mut self, force: f64) {
        let State {
            x,
            x_dot,
            theta,
            theta_dot,
        } = self.state;
        let (sin_theta, cos_theta) = theta.sin_cos();

        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.state = State {
            x: TAU.mul_add(x_dot, x),
            x_dot: TAU.mul_add(x_acc, x_dot),
            theta: TAU.mul_add(theta_dot, theta),
            theta_dot: TAU.mul_add(theta_acc, theta_dot),
        };
    }

    fn reward(&mut self, terminated: bool) -> f64 {
        if !terminated {
            return 1.0;
        }
        match self.steps_beyond_terminated {
            None => {
                self.steps_beyond_terminated = Some(0);
                1.0
            }
            Some(beyond) => {
                if beyond == 0 {
                    warn!(
                        "step called after the episode terminated; \
                         call reset before stepping again"
                    );
                }
                self.steps_beyond_terminated = Some(beyond.saturating_add(1));
                0.0
            }
        }
    }
}

impl Environment for CartPole {
    fn task(&self) -> TaskKind {
        TaskKind::CartPole
    }

    fn action_labels(&self) -> &'static [&'static str] {
        ACTION_LABELS
    }

    fn observation_kind(&self) -> ObservationKind {
        ObservationKind::Continuous { len: 4 }
    }

    fn max_episode_steps(&self) -> u32 {
        self.max_episode_steps
    }

    fn reset(&mut self) -> Result<Observation, SimError> {
        self.state = State::sample(&mut self.rng);
        self.elapsed_steps = 0;
        self.steps_beyond_terminated = None;
        Ok(self.state.observation())
    }

    fn step(&mut self, action: usize) -> Result<Transition, SimError> {
        let force = match action {
            0 => -FORCE_MAG,
            1 => FORCE_MAG,
            _ => {
                return Err(SimError::InvalidAction {
                    action: action_as_i64(action),
                    actions: ACTION_LABELS.len(),
                });
            }
        };

        self.integrate(force);
        if !self.state.is_finite() {
            return Err(SimError::InvalidState(format!(
                "cart-pole state diverged: {:?}",
                self.state
            )));
        }

        self.elapsed_steps = self.elapsed_steps.saturating_add(1);
        let terminated = self.state.is_terminal();
        let reward = self.reward(terminated);

        Ok(Transition {
            observation: self.state.observation(),
            reward,
            terminated,
            truncated: self.elapsed_steps >= self.max_episode_steps,
        })
    }

    fn render(&self) -> Result<Frame, SimError> {
        if !self.state.is_finite() {
            return Err(SimError::InvalidState(String::from(
                "cannot render a non-finite cart-pole state",
            )));
        }

        let mut frame = Frame::new(SCREEN_WIDTH, SCREEN_HEIGHT, WHITE)?;
        let width = f64::from(SCREEN_WIDTH);
        let height = f64::from(SCREEN_HEIGHT);
        let scale = width / (X_THRESHOLD * 2.0);
        let pole_len = scale * (2.0 * POLE_HALF_LENGTH);

        // World drawing uses y-up coordinates; flip when emitting points.
        let to_screen = |x: f64, y: f64| point(x, height - y);

        let cart_x = self.state.x.mul_add(scale, width / 2.0);
        let axle_y = CART_Y + CART_HEIGHT / 4.0;
        let (half_w, half_h) = (CART_WIDTH / 2.0, CART_HEIGHT / 2.0);

        let (sin_theta, cos_theta) = self.state.theta.sin_cos();
        let half_pole = POLE_WIDTH / 2.0;
        let pole: Vec<(i32, i32)> = [
            (-half_pole, -half_pole),
            (-half_pole, pole_len - half_pole),
            (half_pole, pole_len - half_pole),
            (half_pole, -half_pole),
        ]
        .into_iter()
        .map(|(px, py)| {
            let rx = px.mul_add(cos_theta, py * sin_theta);
            let ry = py.mul_add(cos_theta, -px * sin_theta);
            to_screen(rx + cart_x, ry + axle_y)
        })
        .collect();

        frame.draw(|area| {
            area.draw(&Rectangle::new(
                [
                    to_screen(cart_x - half_w, CART_Y + half_h),
                    to_screen(cart_x + half_w, CART_Y - half_h),
                ],
                rgb(BLACK).filled(),
            ))
            .map_err(draw_error)?;
            area.draw(&Polygon::new(pole, rgb(POLE_COLOR).filled()))
                .map_err(draw_error)?;
            area.draw(&Circle::new(
                to_screen(cart_x, axle_y),
                pixels(half_pole),
                rgb(AXLE_COLOR).filled(),
            ))
            .map_err(draw_error)?;
            area.draw(&PathElement::new(
                vec![to_screen(0.0, CART_Y), to_screen(width, CART_Y)],
                rgb(BLACK).stroke_width(1),
            ))
            .map_err(draw_error)
        })?;

        Ok(frame)
    }
}
