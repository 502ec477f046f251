pub mod dense;
pub mod initialization;

pub use dense::{DenseLayer, Layer};
pub use initialization::WeightInit;
