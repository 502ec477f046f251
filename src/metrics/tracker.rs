use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Summary of one finished episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// 1-based
    pub episode: usize,
    pub total_reward: f32,
    /// Decision steps taken
    pub steps: usize,
    /// Exploration rate when the episode ended
    pub epsilon: f32,
    /// Replay updates that actually fitted the network
    pub updates: usize,
    /// Mean loss over those updates, `None` when memory never filled a batch
    pub mean_loss: Option<f32>,
}

/// Per-episode results of a training run, in episode order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub episodes: Vec<EpisodeRecord>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        TrainingHistory::default()
    }

    pub fn push(&mut self, record: EpisodeRecord) {
        self.episodes.push(record);
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn last(&self) -> Option<&EpisodeRecord> {
        self.episodes.last()
    }

    /// Total reward of every episode.
    pub fn rewards(&self) -> Vec<f32> {
        self.episodes.iter().map(|e| e.total_reward).collect()
    }

    pub fn total_steps(&self) -> usize {
        self.episodes.iter().map(|e| e.steps).sum()
    }

    /// Mean total reward of the last `window` episodes.
    pub fn avg_reward(&self, window: usize) -> Option<f32> {
        if self.episodes.is_empty() || window == 0 {
            return None;
        }
        let n = window.min(self.episodes.len());
        let sum: f32 = self.episodes.iter().rev().take(n).map(|e| e.total_reward).sum();
        Some(sum / n as f32)
    }

    pub fn best_reward(&self) -> Option<f32> {
        self.episodes
            .iter()
            .map(|e| e.total_reward)
            .fold(None, |best, r| match best {
                Some(b) if b >= r => Some(b),
                _ => Some(r),
            })
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> crate::error::Result<()> {
        crate::artifacts::ensure_parent(path.as_ref())?;
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Accumulates reward, steps and losses while an episode runs.
#[derive(Debug, Clone, Default)]
pub struct EpisodeTracker {
    reward: f32,
    steps: usize,
    loss_sum: f32,
    updates: usize,
}

impl EpisodeTracker {
    pub fn new() -> Self {
        EpisodeTracker::default()
    }

    pub fn step(&mut self, reward: f32) {
        self.reward += reward;
        self.steps += 1;
    }

    pub fn record_loss(&mut self, loss: f32) {
        self.loss_sum += loss;
        self.updates += 1;
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Close the episode with its 1-based number and the final epsilon.
    pub fn finish(&self, episode: usize, epsilon: f32) -> EpisodeRecord {
        EpisodeRecord {
            episode,
            total_reward: self.reward,
            steps: self.steps,
            epsilon,
            updates: self.updates,
            mean_loss: if self.updates > 0 {
                Some(self.loss_sum / self.updates as f32)
            } else {
                None
            },
        }
    }
}
