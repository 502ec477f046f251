use ndarray::{Array2, Array1};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;

/// Weight initialization strategies
#[derive(Debug, Clone)]
pub enum WeightInit {
    /// Xavier/Glorot uniform weights with zero biases
    XavierUniform,
}

impl WeightInit {
    /// Initialize weights for a layer
    pub fn initialize_weights(&self, shape: (usize, usize)) -> Array2<f32> {
        let (fan_in, fan_out) = shape;

        match self {
            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Array2::random(shape, Uniform::new(-limit, limit))
            }
        }
    }

    /// Initialize biases for a layer
    pub fn initialize_biases(&self, size: usize) -> Array1<f32> {
        match self {
            WeightInit::XavierUniform => Array1::zeros(size),
        }
    }
}
