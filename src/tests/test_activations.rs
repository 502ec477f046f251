use ndarray::{array, Array2};
use crate::activations::Activation;

#[test]
fn test_relu_activation() {
    let relu = Activation::Relu;
    let mut input = array![-1.0, 0.0, 1.0, 2.0];
    relu.apply(&mut input);
    assert_eq!(input, array![0.0, 0.0, 1.0, 2.0]);
}

#[test]
fn test_linear_activation_is_identity() {
    let mut input = array![-3.5, 0.0, 7.25];
    Activation::Linear.apply(&mut input);
    assert_eq!(input, array![-3.5, 0.0, 7.25]);

    let mut batch = array![[-1.0, 2.0], [3.0, -4.0]];
    Activation::Linear.apply_batch(&mut batch);
    assert_eq!(batch, array![[-1.0, 2.0], [3.0, -4.0]]);
}

#[test]
fn test_activation_derivatives() {
    let pre = array![[-1.0, 0.0], [1.0, 2.0]];

    let deriv = Activation::Relu.derivative_batch(pre.view());
    assert_eq!(deriv, array![[0.0, 0.0], [1.0, 1.0]]);

    let deriv = Activation::Linear.derivative_batch(pre.view());
    assert_eq!(deriv, Array2::<f32>::ones((2, 2)));
}

#[test]
fn test_default_activation() {
    assert_eq!(Activation::default(), Activation::Relu);
}
