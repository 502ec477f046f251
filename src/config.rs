//! Run configuration.
//!
//! Every knob the trainer reads lives in [`Config`]; nothing is read from
//! module-level constants. Defaults reproduce the reference single-junction
//! setup, and a JSON file may override any subset of fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrafficError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub environment: EnvironmentConfig,
    pub training: TrainingConfig,
}

/// Hyper-parameters of the double-DQN learner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub state_size: usize,
    pub action_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub learning_rate: f32,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
    pub memory_size: usize,
    pub batch_size: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            state_size: 8,
            action_size: 2,
            hidden_sizes: vec![32, 32],
            learning_rate: 0.001,
            gamma: 0.95,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            memory_size: 2000,
            batch_size: 64,
        }
    }
}

/// Green and transitional phase indices for one logical action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseProgram {
    pub green: u32,
    pub yellow: u32,
}

/// Simulator and intersection description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub sumo_config: PathBuf,
    /// Simulated seconds per episode
    pub simulation_duration: u32,
    pub phase_duration: u32,
    pub yellow_duration: u32,
    pub traffic_light_id: String,
    /// Monitored lanes, in state-vector order
    pub incoming_lanes: Vec<String>,
    /// Indexed by action
    pub phase_table: Vec<PhaseProgram>,
    pub use_gui: bool,
    pub log_file: PathBuf,
    pub error_log: PathBuf,
    /// Upper bound on any single simulator round trip
    pub step_timeout_secs: u64,
    pub connect_retries: u32,
    /// Extra arguments passed on every reload, after `-c <config> --begin 0`
    pub extra_load_args: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig {
            sumo_config: PathBuf::from("sumo_files/config.sumocfg"),
            simulation_duration: 600,
            phase_duration: 10,
            yellow_duration: 3,
            traffic_light_id: "J1".to_string(),
            incoming_lanes: ["L_to_J1_0", "L_to_J1_1", "T1_to_J1_0", "B1_to_J1_0"]
                .iter()
                .map(|lane| lane.to_string())
                .collect(),
            phase_table: vec![
                PhaseProgram { green: 0, yellow: 1 },
                PhaseProgram { green: 2, yellow: 3 },
            ],
            use_gui: false,
            log_file: PathBuf::from("sumo.log"),
            error_log: PathBuf::from("sumo-errors.log"),
            step_timeout_secs: 60,
            connect_retries: 60,
            extra_load_args: Vec::new(),
        }
    }
}

/// Episode loop and artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Save a checkpoint after every episode `e > 0` with `e % checkpoint_every == 0`
    pub checkpoint_every: usize,
    /// Cap on decision steps per episode, on top of the simulator's own end
    pub max_steps_per_episode: Option<usize>,
    pub model_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: 2,
            checkpoint_every: 5,
            max_steps_per_episode: None,
            model_dir: PathBuf::from("models"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Read a JSON config; absent fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            TrafficError::IoError(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        self.environment.validate()?;
        self.training.validate()?;

        let lanes = self.environment.incoming_lanes.len();
        if self.agent.state_size != 2 * lanes {
            return Err(TrafficError::invalid_parameter(
                "agent.state_size".to_string(),
                format!(
                    "must be 2 x {} monitored lanes = {}, got {}",
                    lanes,
                    2 * lanes,
                    self.agent.state_size
                ),
            ));
        }
        if self.agent.action_size != self.environment.phase_table.len() {
            return Err(TrafficError::invalid_parameter(
                "agent.action_size".to_string(),
                format!(
                    "must match the {} phase table entries, got {}",
                    self.environment.phase_table.len(),
                    self.agent.action_size
                ),
            ));
        }
        Ok(())
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 || self.action_size == 0 {
            return Err(TrafficError::invalid_parameter(
                "agent.state_size/action_size",
                "must be greater than 0",
            ));
        }
        if self.hidden_sizes.iter().any(|&h| h == 0) {
            return Err(TrafficError::invalid_parameter(
                "agent.hidden_sizes",
                "hidden layers must have at least one unit",
            ));
        }
        if self.batch_size == 0 {
            return Err(TrafficError::invalid_parameter(
                "agent.batch_size",
                "must be greater than 0",
            ));
        }
        if self.memory_size < self.batch_size {
            return Err(TrafficError::invalid_parameter(
                "agent.memory_size".to_string(),
                format!("must hold at least one batch ({})", self.batch_size),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(TrafficError::invalid_parameter(
                "agent.learning_rate",
                "must be a positive finite number",
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(TrafficError::invalid_parameter(
                "agent.gamma",
                "must lie in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon_min)
            || !(0.0..=1.0).contains(&self.epsilon_start)
            || self.epsilon_min > self.epsilon_start
        {
            return Err(TrafficError::invalid_parameter(
                "agent.epsilon_start/epsilon_min",
                "need 0 <= epsilon_min <= epsilon_start <= 1",
            ));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(TrafficError::invalid_parameter(
                "agent.epsilon_decay",
                "must lie in (0, 1]",
            ));
        }
        Ok(())
    }
}

impl EnvironmentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.phase_duration == 0 || self.yellow_duration == 0 || self.simulation_duration == 0 {
            return Err(TrafficError::invalid_parameter(
                "environment durations",
                "phase, yellow and simulation durations must be greater than 0",
            ));
        }
        if self.incoming_lanes.is_empty() {
            return Err(TrafficError::invalid_parameter(
                "environment.incoming_lanes",
                "at least one lane must be monitored",
            ));
        }
        if self.phase_table.is_empty() {
            return Err(TrafficError::invalid_parameter(
                "environment.phase_table",
                "at least one action must be defined",
            ));
        }
        if self.traffic_light_id.is_empty() {
            return Err(TrafficError::invalid_parameter(
                "environment.traffic_light_id",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Simulated ticks consumed by one decision step.
    pub fn ticks_per_decision(&self) -> u32 {
        self.phase_duration + self.yellow_duration
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_every == 0 {
            return Err(TrafficError::invalid_parameter(
                "training.checkpoint_every",
                "must be greater than 0",
            ));
        }
        if self.max_steps_per_episode == Some(0) {
            return Err(TrafficError::invalid_parameter(
                "training.max_steps_per_episode",
                "must be greater than 0 when set",
            ));
        }
        Ok(())
    }
}
