use ndarray::{array, arr2, Array1, Array2, ArrayView1, ArrayView2};
use tempfile::tempdir;
use crate::activations::Activation;
use crate::agent::{argmax, double_dqn_targets, Batch, DqnAgent, ExplorationSchedule, ValueFunction};
use crate::config::AgentConfig;
use crate::error::{Result, TrafficError};
use crate::network::{NeuralNetwork, Parameters};
use crate::optimizer::{OptimizerWrapper, SGD};
use crate::replay_buffer::Experience;

fn small_config() -> AgentConfig {
    AgentConfig {
        state_size: 2,
        action_size: 2,
        hidden_sizes: vec![8],
        batch_size: 4,
        memory_size: 100,
        ..AgentConfig::default()
    }
}

fn experience(action: usize, reward: f32, done: bool) -> Experience {
    Experience {
        state: array![0.5, -0.5],
        action,
        reward,
        next_state: array![0.6, -0.4],
        done,
    }
}

/// Linear single-layer network with fixed weights, so Q-values are easy to read off.
fn linear_network(weights: Array2<f32>) -> NeuralNetwork {
    let (inputs, outputs) = weights.dim();
    let mut network = NeuralNetwork::new(
        &[inputs, outputs],
        &[Activation::Linear],
        OptimizerWrapper::SGD(SGD::new()),
        0.01,
    );
    network.layers[0].weights = weights;
    network
}

/// Approximator that always predicts the same values and records what it was fitted on.
#[derive(Clone)]
struct FixedValues {
    values: Array1<f32>,
    fitted: Vec<Array2<f32>>,
}

impl ValueFunction for FixedValues {
    fn predict(&self, _state: ArrayView1<f32>) -> Array1<f32> {
        self.values.clone()
    }

    fn predict_batch(&self, states: ArrayView2<f32>) -> Array2<f32> {
        let mut out = Array2::zeros((states.nrows(), self.values.len()));
        for mut row in out.rows_mut() {
            row.assign(&self.values);
        }
        out
    }

    fn fit(&mut self, _states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        self.fitted.push(targets.to_owned());
        Ok(0.0)
    }

    fn parameters(&self) -> Parameters {
        Parameters { weights: Vec::new(), biases: vec![self.values.clone()] }
    }

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<()> {
        self.values = parameters.biases[0].clone();
        Ok(())
    }
}

#[test]
fn test_agent_creation() {
    let config = AgentConfig::default();
    let agent = DqnAgent::new(&config).unwrap();

    assert_eq!(agent.epsilon(), 1.0);
    assert_eq!(agent.memory_len(), 0);
    assert_eq!(agent.memory().capacity(), 2000);
    assert_eq!(agent.train_steps(), 0);
    assert_eq!(agent.action_size(), 2);
    assert_eq!(agent.online.parameters(), agent.target.parameters());
}

#[test]
fn test_agent_rejects_invalid_config() {
    let config = AgentConfig { batch_size: 0, ..small_config() };
    assert!(DqnAgent::new(&config).is_err());

    let config = AgentConfig { epsilon_min: 0.5, epsilon_start: 0.1, ..small_config() };
    assert!(DqnAgent::new(&config).is_err());
}

#[test]
fn test_act_greedy_when_epsilon_zero() {
    let config = AgentConfig { epsilon_start: 0.0, epsilon_min: 0.0, ..small_config() };
    let mut agent = DqnAgent::new(&config).unwrap().with_seed(7);
    let state = array![1.0, 3.0];

    let greedy = agent.best_action(state.view()).unwrap();
    for _ in 0..100 {
        assert_eq!(agent.act(state.view()).unwrap(), greedy);
    }
}

#[test]
fn test_act_uniform_when_epsilon_one() {
    let config = small_config();
    let mut agent = DqnAgent::new(&config).unwrap().with_seed(42);
    let state = array![1.0, 3.0];

    let mut counts = [0usize; 2];
    for _ in 0..2000 {
        counts[agent.act(state.view()).unwrap()] += 1;
    }
    assert!(counts[0] > 800 && counts[1] > 800, "counts {:?}", counts);
}

#[test]
fn test_act_rejects_wrong_state_length() {
    let mut agent = DqnAgent::new(&small_config()).unwrap();
    let state = array![1.0, 2.0, 3.0];
    assert!(matches!(
        agent.act(state.view()),
        Err(TrafficError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_replay_skipped_until_batch_available() {
    let config = small_config();
    let mut agent = DqnAgent::new(&config).unwrap();
    let before = agent.online.parameters();

    for _ in 0..config.batch_size - 1 {
        agent.remember(experience(0, 1.0, false));
        assert_eq!(agent.replay().unwrap(), None);
    }

    assert_eq!(agent.epsilon(), config.epsilon_start);
    assert_eq!(agent.train_steps(), 0);
    assert_eq!(agent.online.parameters(), before);
}

#[test]
fn test_replay_fits_and_decays_epsilon() {
    let config = small_config();
    let mut agent = DqnAgent::new(&config).unwrap().with_seed(1);
    for i in 0..config.batch_size {
        agent.remember(experience(i % 2, -1.0, false));
    }
    let target_before = agent.target.parameters();

    let loss = agent.replay().unwrap();
    assert!(loss.is_some());
    assert_eq!(agent.train_steps(), 1);
    assert!((agent.epsilon() - config.epsilon_start * config.epsilon_decay).abs() < 1e-6);

    // Replay never touches the target network.
    assert_eq!(agent.target.parameters(), target_before);
    assert_ne!(agent.online.parameters(), target_before);
}

#[test]
fn test_replay_overwrites_only_taken_action() {
    let config = AgentConfig { gamma: 0.5, ..small_config() };
    let online = FixedValues { values: array![1.0, 2.0], fitted: Vec::new() };
    let target = online.clone();
    let mut agent = DqnAgent::with_networks(&config, online, target).unwrap();

    for _ in 0..config.batch_size {
        agent.remember(experience(0, 10.0, false));
    }
    agent.replay().unwrap();

    let fitted = &agent.online.fitted[0];
    assert_eq!(fitted.dim(), (config.batch_size, 2));
    for row in fitted.rows() {
        // best next action is 1 with value 2.0: 10 + 0.5 * 2
        assert_eq!(row[0], 11.0);
        assert_eq!(row[1], 2.0);
    }
}

#[test]
fn test_done_target_is_reward() {
    let online = NeuralNetwork::q_network(2, &[8], 2, 0.001);
    let target = NeuralNetwork::q_network(2, &[8], 2, 0.001);
    let exps = [experience(0, -3.0, true), experience(1, 7.5, true)];
    let refs: Vec<&Experience> = exps.iter().collect();
    let batch = Batch::from_experiences(&refs, 2, 2).unwrap();

    let targets = double_dqn_targets(&online, &target, &batch, 0.95);
    assert_eq!(targets, array![-3.0, 7.5]);
}

#[test]
fn test_double_dqn_online_selects_target_evaluates() {
    // next_state = [1, 0]: online picks action 0, target scores it 5 although its own max is 10.
    let online = linear_network(arr2(&[[1.0, 0.0], [0.0, 0.0]]));
    let target = linear_network(arr2(&[[5.0, 10.0], [0.0, 0.0]]));
    let exp = Experience {
        state: array![0.0, 0.0],
        action: 1,
        reward: 1.0,
        next_state: array![1.0, 0.0],
        done: false,
    };
    let batch = Batch::from_experiences(&[&exp], 2, 2).unwrap();
    assert_eq!(batch.len(), 1);
    assert!(!batch.is_empty());

    let targets = double_dqn_targets(&online, &target, &batch, 0.5);
    assert!((targets[0] - 3.5).abs() < 1e-6);
}

#[test]
fn test_batch_rejects_bad_transitions() {
    let bad_action = experience(5, 0.0, false);
    assert!(matches!(
        Batch::from_experiences(&[&bad_action], 2, 2),
        Err(TrafficError::InvalidAction { action: 5, max_actions: 2 })
    ));

    let mut bad_state = experience(0, 0.0, false);
    bad_state.state = array![1.0];
    assert!(Batch::from_experiences(&[&bad_state], 2, 2).is_err());
}

#[test]
fn test_update_target_model() {
    let mut agent = DqnAgent::new(&small_config()).unwrap();
    agent.online.layers[0].weights[[0, 0]] = 999.0;
    assert_ne!(agent.target.layers[0].weights[[0, 0]], 999.0);

    agent.update_target_model().unwrap();

    let state = array![0.25, -2.0];
    assert_eq!(agent.target.parameters(), agent.online.parameters());
    assert_eq!(agent.target.predict(state.view()), agent.online.predict(state.view()));
}

#[test]
fn test_epsilon_schedule() {
    let mut schedule = ExplorationSchedule::new(1.0, 0.01, 0.995);
    for _ in 0..200 {
        schedule.decay();
    }
    assert!((schedule.epsilon() - 0.995f32.powi(200)).abs() < 1e-3);
    assert!((schedule.epsilon() - 0.367).abs() < 1e-2);

    let mut previous = schedule.epsilon();
    for _ in 0..2000 {
        let next = schedule.decay();
        assert!(next <= previous);
        assert!(next >= 0.01);
        previous = next;
    }
    assert_eq!(schedule.epsilon(), 0.01);
}

#[test]
fn test_set_epsilon_respects_floor() {
    let mut agent = DqnAgent::new(&small_config()).unwrap();
    agent.set_epsilon(0.3);
    assert_eq!(agent.epsilon(), 0.3);
    agent.set_epsilon(0.0);
    assert_eq!(agent.epsilon(), 0.01);
}

#[test]
fn test_set_epsilon_never_raises() {
    let config = AgentConfig {
        epsilon_start: 0.2,
        epsilon_min: 0.01,
        ..small_config()
    };
    let mut agent = DqnAgent::new(&config).unwrap();
    agent.set_epsilon(0.9);
    assert_eq!(agent.epsilon(), 0.2);
    assert!(agent.epsilon() <= config.epsilon_start);

    agent.set_epsilon(0.1);
    agent.set_epsilon(0.15);
    assert_eq!(agent.epsilon(), 0.1);

    let mut schedule = ExplorationSchedule::new(0.5, 0.05, 0.9);
    schedule.decay();
    schedule.set_epsilon(1.0);
    assert!((schedule.epsilon() - 0.45).abs() < 1e-6);
}

#[test]
fn test_argmax_ties_and_nan() {
    assert_eq!(argmax(array![1.0, 3.0, 3.0].view()), 1);
    assert_eq!(argmax(array![f32::NAN, 0.5, -1.0].view()), 1);
    assert_eq!(argmax(array![-2.0, -1.0].view()), 1);
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.bin");

    let config = small_config();
    let agent = DqnAgent::new(&config).unwrap();
    agent.save(&path).unwrap();

    let mut restored = DqnAgent::new(&config).unwrap();
    let target_before = restored.target.parameters();
    restored.load(&path).unwrap();

    assert_eq!(restored.online.parameters(), agent.online.parameters());
    // Loading leaves the target alone until the caller syncs.
    assert_eq!(restored.target.parameters(), target_before);
    restored.update_target_model().unwrap();
    assert_eq!(restored.target.parameters(), agent.online.parameters());
}
