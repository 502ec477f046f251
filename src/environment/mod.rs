//! # Environment
//!
//! The trainer only sees [`SteppableEnvironment`]: reset to an initial state,
//! apply one discrete action per decision step, and release the underlying
//! resources once at the end. [`IntersectionEnv`] is the implementation that
//! drives a single signalised junction through a [`SimulatorSession`].
//!
//! [`SimulatorSession`]: crate::simulator::SimulatorSession

mod intersection;

pub use intersection::IntersectionEnv;

use ndarray::Array1;

use crate::error::Result;

/// Everything one decision step produces.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub next_state: Array1<f32>,
    pub reward: f32,
    pub done: bool,
}

/// Episodic environment with a fixed-length state and a discrete action set
pub trait SteppableEnvironment {
    /// Length of every state vector returned by `reset` and `step`
    fn state_size(&self) -> usize;

    /// Number of valid actions, `0..action_count()`
    fn action_count(&self) -> usize;

    /// Start a new episode and return its initial state.
    fn reset(&mut self) -> Result<Array1<f32>>;

    /// Apply `action` and advance to the next decision point.
    fn step(&mut self, action: usize) -> Result<StepOutcome>;

    /// Release the environment. Calling it again is a no-op.
    fn close(&mut self) -> Result<()>;
}
