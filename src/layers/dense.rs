use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Serialize, Deserialize};
use crate::activations::Activation;
use crate::error::{Result, TrafficError};
use super::initialization::WeightInit;

/// A fully connected (dense) layer in a neural network
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer with Glorot-uniform weights and zero biases.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        Self::with_init(input_size, output_size, activation, &WeightInit::XavierUniform)
    }

    pub fn with_init(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: &WeightInit,
    ) -> Self {
        DenseLayer {
            weights: init.initialize_weights((input_size, output_size)),
            biases: init.initialize_biases(output_size),
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Self {
        assert_eq!(weights.dim(), self.weights.dim());
        self.weights = weights;
        self
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Self {
        assert_eq!(biases.dim(), self.biases.dim());
        self.biases = biases;
        self
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    /// Forward pass for a single input vector. Does not touch the training cache.
    pub fn forward(&self, input: ArrayView1<f32>) -> Array1<f32> {
        let mut output = input.dot(&self.weights) + &self.biases;
        self.activation.apply(&mut output);
        output
    }

    /// Forward pass for a batch of input rows. Does not touch the training cache.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.pre_activation(inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Forward pass that remembers inputs and pre-activations for `backward_batch`.
    pub fn forward_batch_cached(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let pre_activation = self.pre_activation(inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);
        self.inputs = Some(inputs.to_owned());
        self.pre_activation_output = Some(pre_activation);
        outputs
    }

    /// Back-propagate a batch of output errors.
    ///
    /// Returns `(adjusted_error, weight_gradients, bias_gradients)`; the adjusted
    /// error is the error at this layer's pre-activation, used to continue the
    /// chain into the previous layer.
    pub fn backward_batch(
        &self,
        output_errors: ArrayView2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>, Array1<f32>)> {
        let (pre_activation_output, inputs) = match (&self.pre_activation_output, &self.inputs) {
            (Some(pre), Some(inputs)) => (pre, inputs),
            _ => {
                return Err(TrafficError::NumericalError(
                    "forward_batch_cached() must be called before backward_batch()".to_string(),
                ))
            }
        };

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));

        Ok((adjusted_error, weight_gradients, bias_gradients))
    }

    /// Drop the cached activations once a gradient step is done.
    pub fn clear_cache(&mut self) {
        self.inputs = None;
        self.pre_activation_output = None;
    }

    fn pre_activation(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }
}

pub type Layer = DenseLayer;

impl Layer {
    /// Build the layer stack for `layer_sizes`: ReLU on hidden layers, linear output.
    pub fn to_vector(layer_sizes: &[usize]) -> Vec<Layer> {
        let mut layers = Vec::new();
        for i in 0..layer_sizes.len().saturating_sub(1) {
            let activation = if i == layer_sizes.len() - 2 {
                Activation::Linear
            } else {
                Activation::Relu
            };
            layers.push(Layer::new(layer_sizes[i], layer_sizes[i + 1], activation));
        }
        layers
    }
}
