use serde::{Serialize, Deserialize};

use crate::config::AgentConfig;

/// Multiplicative epsilon decay with a floor.
///
/// [`ExplorationSchedule::decay`] yields `max(min, epsilon * decay)` and
/// [`ExplorationSchedule::set_epsilon`] can only lower the value, so epsilon
/// stays within `[min, start]` and never increases.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExplorationSchedule {
    epsilon: f32,
    min: f32,
    decay: f32,
}

impl ExplorationSchedule {
    pub fn new(start: f32, min: f32, decay: f32) -> Self {
        ExplorationSchedule {
            epsilon: start.max(min),
            min,
            decay,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.epsilon_start, config.epsilon_min, config.epsilon_decay)
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Apply one decay step and return the new value.
    pub fn decay(&mut self) -> f32 {
        self.epsilon = (self.epsilon * self.decay).max(self.min);
        self.epsilon
    }

    /// Lower the current value, e.g. when resuming a partly trained run.
    /// Requests above the current epsilon are capped at it and the floor
    /// still applies.
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.min(self.epsilon).max(self.min);
    }
}
