use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::path::Path;

use crate::error::Result;
use crate::network::{NeuralNetwork, Parameters};
use crate::replay_buffer::Experience;

/// A regressor from a state vector to one value estimate per action.
///
/// The agent owns two independent instances of an implementor: the online
/// approximator that `fit` updates, and the target approximator that only
/// ever receives whole parameter copies.
pub trait ValueFunction {
    /// Value estimates for one state.
    fn predict(&self, state: ArrayView1<f32>) -> Array1<f32>;

    /// Value estimates for a batch of states, one row per state.
    fn predict_batch(&self, states: ArrayView2<f32>) -> Array2<f32>;

    /// One gradient step towards `targets`; returns the loss before the step.
    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32>;

    fn parameters(&self) -> Parameters;

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<()>;

    fn save(&self, path: &Path) -> Result<()> {
        self.parameters().save(path)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let parameters = Parameters::load(path)?;
        self.set_parameters(&parameters)
    }
}

impl ValueFunction for NeuralNetwork {
    fn predict(&self, state: ArrayView1<f32>) -> Array1<f32> {
        self.forward(state)
    }

    fn predict_batch(&self, states: ArrayView2<f32>) -> Array2<f32> {
        self.forward_batch(states)
    }

    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        self.train_minibatch(states, targets)
    }

    fn parameters(&self) -> Parameters {
        NeuralNetwork::parameters(self)
    }

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<()> {
        NeuralNetwork::set_parameters(self, parameters)
    }
}

/// What the training loop needs from a learner.
pub trait Policy {
    /// Choose an action for `state`.
    fn act(&mut self, state: ArrayView1<f32>) -> Result<usize>;

    /// Record a transition in replay memory.
    fn remember(&mut self, experience: Experience);

    /// Run one learning update if enough experience is stored.
    ///
    /// `Ok(None)` means the update was skipped.
    fn replay(&mut self) -> Result<Option<f32>>;

    /// Copy the online parameters into the target approximator.
    fn update_target_model(&mut self) -> Result<()>;

    /// Current exploration rate.
    fn exploration_rate(&self) -> f32;

    /// Persist whatever the policy considers its checkpoint.
    fn save(&self, path: &Path) -> Result<()>;

    /// Restore a checkpoint written by [`Policy::save`].
    fn load(&mut self, path: &Path) -> Result<()>;
}
