use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::{debug, trace};

use crate::agent::exploration::ExplorationSchedule;
use crate::agent::traits::{Policy, ValueFunction};
use crate::config::AgentConfig;
use crate::error::{Result, TrafficError};
use crate::network::NeuralNetwork;
use crate::replay_buffer::{Experience, ReplayBuffer};

/// Double-DQN agent with experience replay and a periodically synced target network.
///
/// # Example
///
/// ```rust
/// use signalq::agent::DqnAgent;
/// use signalq::config::AgentConfig;
/// use signalq::replay_buffer::Experience;
/// use ndarray::Array1;
///
/// let config = AgentConfig::default();
/// let mut agent = DqnAgent::new(&config).unwrap();
///
/// let state = Array1::zeros(config.state_size);
/// let action = agent.act(state.view()).unwrap();
/// assert!(action < config.action_size);
///
/// agent.remember(Experience {
///     state: state.clone(),
///     action,
///     reward: -4.0,
///     next_state: state,
///     done: false,
/// });
///
/// // One transition is far below a full batch, so nothing is learned yet.
/// assert_eq!(agent.replay().unwrap(), None);
/// assert_eq!(agent.epsilon(), config.epsilon_start);
/// ```
pub struct DqnAgent<V: ValueFunction = NeuralNetwork> {
    /// Updated by every successful replay
    pub online: V,

    /// Only ever overwritten wholesale by `update_target_model`
    pub target: V,

    memory: ReplayBuffer,
    exploration: ExplorationSchedule,
    gamma: f32,
    batch_size: usize,
    state_size: usize,
    action_size: usize,
    train_steps: usize,
    rng: StdRng,
}

impl DqnAgent<NeuralNetwork> {
    /// Build online and target networks from `config` and sync them once.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        config.validate()?;
        let build = || {
            NeuralNetwork::q_network(
                config.state_size,
                &config.hidden_sizes,
                config.action_size,
                config.learning_rate,
            )
        };
        Self::with_networks(config, build(), build())
    }
}

impl<V: ValueFunction> DqnAgent<V> {
    /// Assemble an agent from two independently allocated approximators.
    ///
    /// The target is overwritten with the online parameters so both start equal.
    pub fn with_networks(config: &AgentConfig, online: V, target: V) -> Result<Self> {
        config.validate()?;
        let mut agent = DqnAgent {
            online,
            target,
            memory: ReplayBuffer::new(config.memory_size),
            exploration: ExplorationSchedule::from_config(config),
            gamma: config.gamma,
            batch_size: config.batch_size,
            state_size: config.state_size,
            action_size: config.action_size,
            train_steps: 0,
            rng: StdRng::from_entropy(),
        };
        agent.update_target_model()?;
        Ok(agent)
    }

    /// Replace the random source, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon()
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.exploration.set_epsilon(epsilon);
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Number of replay updates that actually fitted the online network.
    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    /// Epsilon-greedy action selection.
    pub fn act(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        self.check_state(state)?;

        if self.rng.gen::<f32>() < self.exploration.epsilon() {
            Ok(self.rng.gen_range(0..self.action_size))
        } else {
            Ok(argmax(self.online.predict(state).view()))
        }
    }

    /// Greedy action, ignoring epsilon.
    pub fn best_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        self.check_state(state)?;
        Ok(argmax(self.online.predict(state).view()))
    }

    pub fn remember(&mut self, experience: Experience) {
        self.memory.add(experience);
    }

    /// One double-DQN learning update from a uniformly sampled minibatch.
    ///
    /// Returns `Ok(None)` without touching the networks or epsilon while
    /// memory holds fewer than `batch_size` transitions.
    pub fn replay(&mut self) -> Result<Option<f32>> {
        if self.memory.len() < self.batch_size {
            trace!(
                memory = self.memory.len(),
                batch_size = self.batch_size,
                "replay skipped, memory under-filled"
            );
            return Ok(None);
        }

        let batch = {
            let sampled = self.memory.sample_with(&mut self.rng, self.batch_size)?;
            Batch::from_experiences(&sampled, self.state_size, self.action_size)?
        };

        let targets = double_dqn_targets(&self.online, &self.target, &batch, self.gamma);

        // Non-taken actions keep the online estimate, so their error is zero.
        let mut target_values = self.online.predict_batch(batch.states.view());
        for (row, (&action, &target)) in batch.actions.iter().zip(targets.iter()).enumerate() {
            target_values[[row, action]] = target;
        }

        let loss = self.online.fit(batch.states.view(), target_values.view())?;

        let epsilon = self.exploration.decay();
        self.train_steps += 1;
        debug!(loss, epsilon, train_steps = self.train_steps, "replay update");

        Ok(Some(loss))
    }

    /// Copy the online parameters into the target network.
    pub fn update_target_model(&mut self) -> Result<()> {
        let parameters = self.online.parameters();
        self.target.set_parameters(&parameters)
    }

    /// Save the online network's parameters. Memory, epsilon and the target
    /// network are not part of a checkpoint.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.online.save(path.as_ref())
    }

    /// Restore the online network's parameters from [`DqnAgent::save`].
    ///
    /// The target network is left alone; call
    /// [`DqnAgent::update_target_model`] to align it.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.online.load(path.as_ref())
    }

    fn check_state(&self, state: ArrayView1<f32>) -> Result<()> {
        if state.len() != self.state_size {
            return Err(TrafficError::dimension_mismatch(
                format!("state of length {}", self.state_size),
                format!("state of length {}", state.len()),
            ));
        }
        Ok(())
    }
}

impl<V: ValueFunction> Policy for DqnAgent<V> {
    fn act(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        DqnAgent::act(self, state)
    }

    fn remember(&mut self, experience: Experience) {
        DqnAgent::remember(self, experience)
    }

    fn replay(&mut self) -> Result<Option<f32>> {
        DqnAgent::replay(self)
    }

    fn update_target_model(&mut self) -> Result<()> {
        DqnAgent::update_target_model(self)
    }

    fn exploration_rate(&self) -> f32 {
        self.epsilon()
    }

    fn save(&self, path: &Path) -> Result<()> {
        DqnAgent::save(self, path)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        DqnAgent::load(self, path)
    }
}

/// A sampled minibatch stacked into arrays, one row per transition.
#[derive(Debug, Clone)]
pub struct Batch {
    pub states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_states: Array2<f32>,
    pub dones: Vec<bool>,
}

impl Batch {
    pub fn from_experiences(experiences: &[&Experience], state_size: usize, action_size: usize) -> Result<Self> {
        let batch_size = experiences.len();
        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Vec::with_capacity(batch_size);

        for (i, exp) in experiences.iter().enumerate() {
            if exp.state.len() != state_size || exp.next_state.len() != state_size {
                return Err(TrafficError::dimension_mismatch(
                    format!("state of length {}", state_size),
                    format!("state of length {}/{}", exp.state.len(), exp.next_state.len()),
                ));
            }
            if exp.action >= action_size {
                return Err(TrafficError::InvalidAction {
                    action: exp.action,
                    max_actions: action_size,
                });
            }
            states.row_mut(i).assign(&exp.state);
            next_states.row_mut(i).assign(&exp.next_state);
            actions.push(exp.action);
            rewards[i] = exp.reward;
            dones.push(exp.done);
        }

        Ok(Batch { states, actions, rewards, next_states, dones })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Double-DQN value targets for the taken actions of `batch`.
///
/// The online network picks the best next action and the target network
/// scores it: `reward + gamma * Q_target(next, argmax Q_online(next))`.
/// Terminal transitions get their reward alone.
pub fn double_dqn_targets<V: ValueFunction>(online: &V, target: &V, batch: &Batch, gamma: f32) -> Array1<f32> {
    let next_online = online.predict_batch(batch.next_states.view());
    let next_target = target.predict_batch(batch.next_states.view());

    Array1::from_iter((0..batch.len()).map(|i| {
        if batch.dones[i] {
            batch.rewards[i]
        } else {
            let best_action = argmax(next_online.row(i));
            batch.rewards[i] + gamma * next_target[[i, best_action]]
        }
    }))
}

/// Index of the largest value; ties go to the lowest index and NaN never wins.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &value) in values.iter().enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}
