use ndarray::Array1;
use tracing::{debug, trace};

use super::{SteppableEnvironment, StepOutcome};
use crate::config::EnvironmentConfig;
use crate::error::{Result, TrafficError};
use crate::simulator::SimulatorSession;

/// One signalised junction driven through a simulator session.
///
/// A decision step holds the chosen green phase for `phase_duration` ticks,
/// then its yellow phase for `yellow_duration` ticks. The state is
/// `[halting, waiting]` for each monitored lane in configured order and the
/// reward is the negated total waiting time on those lanes.
pub struct IntersectionEnv<S: SimulatorSession> {
    session: S,
    config: EnvironmentConfig,
    step_count: u32,
    closed: bool,
}

impl<S: SimulatorSession> IntersectionEnv<S> {
    /// Wrap an already started session.
    pub fn new(session: S, config: EnvironmentConfig) -> Result<Self> {
        config.validate()?;
        Ok(IntersectionEnv {
            session,
            config,
            step_count: 0,
            closed: false,
        })
    }

    /// Simulated ticks elapsed since the last reset.
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Arguments for the per-episode reload.
    pub fn load_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            self.config.sumo_config.display().to_string(),
            "--begin".to_string(),
            "0".to_string(),
        ];
        args.extend(self.config.extra_load_args.iter().cloned());
        args
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(TrafficError::SimulatorError(
                "environment already closed".to_string(),
            ));
        }
        Ok(())
    }

    fn advance(&mut self, ticks: u32) -> Result<()> {
        for _ in 0..ticks {
            self.session.simulation_step()?;
        }
        self.step_count += ticks;
        Ok(())
    }

    fn observe(&mut self) -> Result<Array1<f32>> {
        let mut state = Array1::zeros(self.state_size());
        for (i, lane) in self.config.incoming_lanes.iter().enumerate() {
            let halting = self.session.lane_halting_number(lane)?;
            let waiting = self.session.lane_waiting_time(lane)?;
            state[2 * i] = halting as f32;
            state[2 * i + 1] = waiting as f32;
        }
        Ok(state)
    }
}

impl<S: SimulatorSession> SteppableEnvironment for IntersectionEnv<S> {
    fn state_size(&self) -> usize {
        2 * self.config.incoming_lanes.len()
    }

    fn action_count(&self) -> usize {
        self.config.phase_table.len()
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.ensure_open()?;
        let args = self.load_args();
        debug!(?args, "reloading simulation");
        self.session.load(&args)?;
        self.step_count = 0;
        self.observe()
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        self.ensure_open()?;
        let program = *self.config.phase_table.get(action).ok_or(TrafficError::InvalidAction {
            action,
            max_actions: self.config.phase_table.len(),
        })?;
        let tls = self.config.traffic_light_id.clone();

        self.session.set_phase(&tls, program.green)?;
        self.advance(self.config.phase_duration)?;

        self.session.set_phase(&tls, program.yellow)?;
        self.advance(self.config.yellow_duration)?;

        let next_state = self.observe()?;
        // Waiting times sit at the odd positions of the state.
        let reward = -next_state.iter().skip(1).step_by(2).sum::<f32>();
        let done = self.step_count >= self.config.simulation_duration;
        trace!(action, reward, step_count = self.step_count, done, "decision step");

        Ok(StepOutcome { next_state, reward, done })
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.session.close()
    }
}
