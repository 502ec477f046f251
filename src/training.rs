//! # Training Loop
//!
//! Episodes run strictly one after another against a single environment:
//! reset, then act / step / remember / replay until the episode ends, then one
//! target-network sync. The loop only knows the [`Policy`] and
//! [`SteppableEnvironment`] traits, so any approximator or simulator that
//! implements them can be trained here.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::agent::Policy;
use crate::artifacts::{ensure_parent, RunArtifacts};
use crate::config::TrainingConfig;
use crate::environment::SteppableEnvironment;
use crate::error::{Result, TrafficError};
use crate::metrics::{EpisodeRecord, EpisodeTracker, TrainingHistory};
use crate::replay_buffer::Experience;
use crate::visualization::training_progress;

/// Drives episodes and writes checkpoints for one run.
pub struct Trainer {
    config: TrainingConfig,
    artifacts: RunArtifacts,
    resume_from: Option<PathBuf>,
}

impl Trainer {
    pub fn new(config: TrainingConfig, artifacts: RunArtifacts) -> Result<Self> {
        config.validate()?;
        Ok(Trainer {
            config,
            artifacts,
            resume_from: None,
        })
    }

    /// Start from a saved checkpoint instead of freshly initialised weights.
    pub fn resume_from<P: Into<PathBuf>>(mut self, checkpoint: P) -> Self {
        self.resume_from = Some(checkpoint.into());
        self
    }

    pub fn artifacts(&self) -> &RunArtifacts {
        &self.artifacts
    }

    /// Train for `config.episodes` episodes.
    ///
    /// Any environment or learning error aborts the run and is returned; the
    /// caller owns the environment and is responsible for closing it.
    pub fn run<P, E>(&self, agent: &mut P, env: &mut E) -> Result<TrainingHistory>
    where
        P: Policy + ?Sized,
        E: SteppableEnvironment + ?Sized,
    {
        if let Some(checkpoint) = &self.resume_from {
            agent.load(checkpoint)?;
            agent.update_target_model()?;
            info!(checkpoint = %checkpoint.display(), "resumed from checkpoint");
        }

        let mut history = TrainingHistory::new();
        for e in 0..self.config.episodes {
            let record = self.run_episode(agent, env, e)?;
            info!(
                "{}",
                training_progress(record.episode, self.config.episodes, record.total_reward, record.epsilon)
            );
            history.push(record);

            if e > 0 && e % self.config.checkpoint_every == 0 {
                let path = self.artifacts.checkpoint(e);
                match save_checkpoint(agent, &path) {
                    Ok(()) => info!(path = %path.display(), "model saved"),
                    Err(err) => warn!(path = %path.display(), error = %err, "checkpoint failed, continuing"),
                }
            }
        }
        Ok(history)
    }

    /// One episode from reset to `done` or the step budget; `e` is 0-based.
    pub fn run_episode<P, E>(&self, agent: &mut P, env: &mut E, e: usize) -> Result<EpisodeRecord>
    where
        P: Policy + ?Sized,
        E: SteppableEnvironment + ?Sized,
    {
        let mut tracker = EpisodeTracker::new();
        let mut state = env.reset()?;
        if state.len() != env.state_size() {
            return Err(TrafficError::dimension_mismatch(
                format!("state of length {}", env.state_size()),
                format!("state of length {}", state.len()),
            ));
        }

        loop {
            let action = agent.act(state.view())?;
            let outcome = env.step(action)?;
            tracker.step(outcome.reward);

            agent.remember(Experience {
                state,
                action,
                reward: outcome.reward,
                next_state: outcome.next_state.clone(),
                done: outcome.done,
            });
            if let Some(loss) = agent.replay()? {
                tracker.record_loss(loss);
            }
            state = outcome.next_state;

            if outcome.done {
                break;
            }
            if let Some(budget) = self.config.max_steps_per_episode {
                if tracker.steps() >= budget {
                    info!(episode = e + 1, budget, "step budget exhausted");
                    break;
                }
            }
        }

        agent.update_target_model()?;
        Ok(tracker.finish(e + 1, agent.exploration_rate()))
    }
}

fn save_checkpoint<P: Policy + ?Sized>(agent: &P, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    agent.save(path)
}
