//! # Agent Module
//!
//! The learner side of the training loop.
//!
//! - [`DqnAgent`]: epsilon-greedy policy over an online value network, a FIFO
//!   replay memory, and a target network refreshed only by whole copies.
//!   Learning targets use double DQN: the online network chooses the next
//!   action and the target network scores it.
//! - [`ExplorationSchedule`]: epsilon with multiplicative decay and a floor,
//!   stepped once per successful replay update.
//! - [`Policy`] and [`ValueFunction`]: the seams the trainer and the agent
//!   are written against, so another learner or approximator can be dropped
//!   in without touching the episode loop.

pub mod traits;
pub mod exploration;

mod dqn;
pub use dqn::{argmax, double_dqn_targets, Batch, DqnAgent};
pub use exploration::ExplorationSchedule;
pub use traits::{Policy, ValueFunction};
