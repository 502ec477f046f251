use ndarray::array;
use crate::activations::Activation;
use crate::layers::Layer;
use crate::optimizer::{Adam, Optimizer, OptimizerWrapper, SGD};

fn assert_close(actual: f32, expected: f32) {
    assert!((actual - expected).abs() < 1e-5, "{} != {}", actual, expected);
}

#[test]
fn test_sgd_update_weights() {
    let mut sgd = SGD::new();
    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.1, 0.2], [0.3, 0.4]];

    sgd.update_weights(0, &mut weights, &gradients, 0.01);

    let expected = array![[0.999, 0.998], [0.997, 0.996]];
    for (w, e) in weights.iter().zip(expected.iter()) {
        assert_close(*w, *e);
    }
}

#[test]
fn test_sgd_update_biases() {
    let mut sgd = SGD::new();
    let mut biases = array![1.0, 1.0];
    let gradients = array![0.1, 0.2];

    sgd.update_biases(0, &mut biases, &gradients, 0.01);

    assert_close(biases[0], 0.999);
    assert_close(biases[1], 0.998);
}

#[test]
fn test_adam_defaults() {
    let layers = vec![Layer::new(2, 2, Activation::Relu)];
    let adam = Adam::default(&layers);

    assert_eq!(adam.beta1, 0.9);
    assert_eq!(adam.beta2, 0.999);
    assert_eq!(adam.epsilon, 1e-7);
    assert_eq!(adam.t, 1);
}

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    // With bias correction the first Adam step is lr * sign(gradient).
    let layers = vec![Layer::new(2, 2, Activation::Relu)];
    let mut adam = Adam::new(&layers, 0.9, 0.999, 1e-8);

    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.1, 0.2], [-0.3, 0.4]];
    adam.update_weights(0, &mut weights, &gradients, 0.01);

    assert_close(weights[[0, 0]], 0.99);
    assert_close(weights[[0, 1]], 0.99);
    assert_close(weights[[1, 0]], 1.01);
    assert_close(weights[[1, 1]], 0.99);

    let mut biases = array![1.0, 1.0];
    adam.update_biases(0, &mut biases, &array![0.1, -0.2], 0.01);
    assert_close(biases[0], 0.99);
    assert_close(biases[1], 1.01);
}

#[test]
fn test_adam_step_counter() {
    let layers = vec![Layer::new(2, 2, Activation::Relu), Layer::new(2, 1, Activation::Linear)];
    let mut optimizer = OptimizerWrapper::Adam(Adam::default(&layers));

    let mut weights = array![[1.0], [1.0]];
    optimizer.update_weights(1, &mut weights, &array![[0.5], [0.5]], 0.001);
    optimizer.finish_step();
    optimizer.finish_step();

    match optimizer {
        OptimizerWrapper::Adam(adam) => assert_eq!(adam.t, 3),
        OptimizerWrapper::SGD(_) => panic!("expected Adam"),
    }
}

#[test]
fn test_adam_keeps_separate_moments_per_layer() {
    let layers = vec![Layer::new(1, 1, Activation::Relu), Layer::new(1, 1, Activation::Linear)];
    let mut adam = Adam::default(&layers);

    let mut first = array![[0.0]];
    let mut second = array![[0.0]];
    adam.update_weights(0, &mut first, &array![[1.0]], 0.1);
    adam.update_weights(1, &mut second, &array![[-1.0]], 0.1);

    assert_close(first[[0, 0]], -0.1);
    assert_close(second[[0, 0]], 0.1);
}
