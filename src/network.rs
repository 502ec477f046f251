use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::activations::Activation;
use crate::error::{Result, TrafficError};
use crate::layers::Layer;
use crate::loss::{Loss, MSE};
use crate::optimizer::{Adam, Optimizer, OptimizerWrapper};

/// Weights and biases of every layer, in layer order.
///
/// This is the unit that moves between the online and target networks and
/// the unit written to checkpoints.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Parameters {
    pub weights: Vec<Array2<f32>>,
    pub biases: Vec<Array1<f32>>,
}

impl Parameters {
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Write the parameters as a bincode blob.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Read a bincode blob written by [`Parameters::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(bincode::deserialize(&data)?)
    }
}

/// A feed-forward network of dense layers trained with mean-squared error.
#[derive(Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<Layer>,
    pub optimizer: OptimizerWrapper,
    pub learning_rate: f32,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes, activations, and optimizer.
    pub fn new(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        learning_rate: f32,
    ) -> Self {
        assert_eq!(layer_sizes.len() - 1, activations.len());

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| Layer::new(window[0], window[1], activation))
            .collect::<Vec<_>>();

        NeuralNetwork { layers, optimizer, learning_rate }
    }

    /// The value-network shape used by the agent: ReLU hidden layers, a
    /// linear output of `action_size`, and Adam at `learning_rate`.
    pub fn q_network(
        state_size: usize,
        hidden_sizes: &[usize],
        action_size: usize,
        learning_rate: f32,
    ) -> Self {
        let mut sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        sizes.push(state_size);
        sizes.extend_from_slice(hidden_sizes);
        sizes.push(action_size);

        let layers = Layer::to_vector(&sizes);
        let optimizer = OptimizerWrapper::Adam(Adam::default(&layers));
        NeuralNetwork { layers, optimizer, learning_rate }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.output_size()).unwrap_or(0)
    }

    /// Perform a forward pass for a single input vector.
    pub fn forward(&self, input: ArrayView1<f32>) -> Array1<f32> {
        let mut current = input.to_owned();
        for layer in &self.layers {
            current = layer.forward(current.view());
        }
        current
    }

    /// Perform a forward pass for a batch of input rows.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            current = layer.forward_batch(current.view());
        }
        current
    }

    fn forward_batch_cached(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_batch_cached(current.view());
        }
        current
    }

    /// Gradients for every layer, in layer order.
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) =
                layer.backward_batch(current_error.view())?;
            gradients.push((weight_gradients, bias_gradients));

            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// One gradient step on a batch of inputs and target outputs.
    ///
    /// Returns the mean-squared error measured before the update.
    pub fn train_minibatch(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        if inputs.nrows() != targets.nrows() {
            return Err(TrafficError::dimension_mismatch(
                format!("{} target rows", inputs.nrows()),
                format!("{} target rows", targets.nrows()),
            ));
        }
        if inputs.ncols() != self.input_size() {
            return Err(TrafficError::dimension_mismatch(
                format!("{} input columns", self.input_size()),
                format!("{} input columns", inputs.ncols()),
            ));
        }
        if targets.ncols() != self.output_size() {
            return Err(TrafficError::dimension_mismatch(
                format!("{} target columns", self.output_size()),
                format!("{} target columns", targets.ncols()),
            ));
        }

        let outputs = self.forward_batch_cached(inputs);
        let loss = MSE.compute_batch(outputs.view(), targets);
        if !loss.is_finite() {
            return Err(TrafficError::NumericalError(format!(
                "non-finite training loss {}",
                loss
            )));
        }

        let output_errors = MSE.gradient_batch(outputs.view(), targets);
        let gradients = self.backward_batch(output_errors.view())?;

        let learning_rate = self.learning_rate;
        for (index, (layer, (weight_gradients, bias_gradients))) in
            self.layers.iter_mut().zip(gradients).enumerate()
        {
            self.optimizer.update_weights(index, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(index, &mut layer.biases, &bias_gradients, learning_rate);
            layer.clear_cache();
        }
        self.optimizer.finish_step();

        Ok(loss)
    }

    /// Snapshot of every layer's weights and biases.
    pub fn parameters(&self) -> Parameters {
        Parameters {
            weights: self.layers.iter().map(|l| l.weights.clone()).collect(),
            biases: self.layers.iter().map(|l| l.biases.clone()).collect(),
        }
    }

    /// Overwrite every layer's weights and biases with a copy of `parameters`.
    pub fn set_parameters(&mut self, parameters: &Parameters) -> Result<()> {
        if parameters.weights.len() != self.layers.len() || parameters.biases.len() != self.layers.len() {
            return Err(TrafficError::dimension_mismatch(
                format!("{} layers", self.layers.len()),
                format!("{} layers", parameters.weights.len()),
            ));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.dim() != parameters.weights[i].dim()
                || layer.biases.dim() != parameters.biases[i].dim()
            {
                return Err(TrafficError::dimension_mismatch(
                    format!("layer {} weights {:?}", i, layer.weights.dim()),
                    format!("layer {} weights {:?}", i, parameters.weights[i].dim()),
                ));
            }
        }

        for (layer, (weights, biases)) in self
            .layers
            .iter_mut()
            .zip(parameters.weights.iter().zip(parameters.biases.iter()))
        {
            layer.weights.assign(weights);
            layer.biases.assign(biases);
        }
        Ok(())
    }

    /// Save the network's parameters to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.parameters().save(path)
    }

    /// Load parameters saved by [`NeuralNetwork::save`] into this network.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let parameters = Parameters::load(path)?;
        self.set_parameters(&parameters)
    }
}
