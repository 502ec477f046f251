//! # Activation Functions Module
//!
//! The value network only needs two activations: ReLU on the hidden layers
//! and the identity on the output layer, which keeps the per-action value
//! estimates unbounded.
//!
//! ```rust
//! use signalq::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![1.0, -0.5, 0.0, 2.0];
//! Activation::Relu.apply(&mut data);
//! assert_eq!(data, array![1.0, 0.0, 0.0, 2.0]);
//! ```

pub mod functions;

pub use functions::Activation;
