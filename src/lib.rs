//! # signalq - Double-DQN Traffic Signal Control
//!
//! signalq trains a reinforcement-learning agent to run one signalised
//! intersection by stepping the SUMO traffic micro-simulator over its TraCI
//! socket protocol. The agent is a double DQN: an online network chosen by
//! epsilon-greedy exploration and fitted on minibatches from a FIFO replay
//! memory, and a target network that is only ever overwritten wholesale once
//! per episode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signalq::agent::DqnAgent;
//! use signalq::artifacts::{RunArtifacts, RunId};
//! use signalq::config::Config;
//! use signalq::environment::{IntersectionEnv, SteppableEnvironment};
//! use signalq::simulator::SumoSession;
//! use signalq::training::Trainer;
//!
//! # fn main() -> signalq::error::Result<()> {
//! let config = Config::default();
//! let mut agent = DqnAgent::new(&config.agent)?;
//!
//! let session = SumoSession::start(&config.environment)?;
//! let mut env = IntersectionEnv::new(session, config.environment.clone())?;
//!
//! let artifacts = RunArtifacts::new(RunId::now(), &config.training);
//! let trainer = Trainer::new(config.training.clone(), artifacts)?;
//! let history = trainer.run(&mut agent, &mut env);
//! env.close()?;
//!
//! println!("rewards: {:?}", history?.rewards());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - ReLU and linear activations
//! - [`agent`] - Double-DQN agent, exploration schedule, `Policy` and `ValueFunction` traits
//! - [`artifacts`] - Run id and artifact paths
//! - [`config`] - Run configuration and validation
//! - [`environment`] - `SteppableEnvironment` trait and the intersection adapter
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layer and weight initialisation
//! - [`loss`] - Mean squared error
//! - [`metrics`] - Per-episode training history
//! - [`network`] - Feed-forward Q-network
//! - [`optimizer`] - SGD and Adam
//! - [`replay_buffer`] - FIFO experience replay
//! - [`simulator`] - TraCI client and SUMO process management
//! - [`training`] - Episode loop
//! - [`visualization`] - Reward CSV, PNG and text plots

pub mod activations;
pub mod agent;
pub mod artifacts;
pub mod config;
pub mod environment;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod simulator;
pub mod training;
pub mod visualization;

#[cfg(test)]
mod tests;
