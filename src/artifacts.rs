//! Names and locations of everything a run writes to disk.

use chrono::Local;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::TrainingConfig;
use crate::error::Result;

/// Timestamp shared by every artifact of one run, `%Y%m%d-%H%M%S` in local time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn now() -> Self {
        RunId(Local::now().format("%Y%m%d-%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        RunId(id.to_string())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Artifact paths of one run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub run_id: RunId,
    pub model_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl RunArtifacts {
    pub fn new(run_id: RunId, config: &TrainingConfig) -> Self {
        RunArtifacts {
            run_id,
            model_dir: config.model_dir.clone(),
            log_dir: config.log_dir.clone(),
        }
    }

    /// `<model_dir>/run_<id>_episode_<e>.bin`
    pub fn checkpoint(&self, episode: usize) -> PathBuf {
        self.model_dir
            .join(format!("run_{}_episode_{}.bin", self.run_id, episode))
    }

    /// `<log_dir>/rewards_<id>.csv`
    pub fn rewards_csv(&self) -> PathBuf {
        self.log_dir.join(format!("rewards_{}.csv", self.run_id))
    }

    /// `<log_dir>/plot_<id>.png`
    pub fn reward_plot(&self) -> PathBuf {
        self.log_dir.join(format!("plot_{}.png", self.run_id))
    }

    /// `<log_dir>/history_<id>.json`
    pub fn history_json(&self) -> PathBuf {
        self.log_dir.join(format!("history_{}.json", self.run_id))
    }
}

/// Create the parent directory of `path` if it is missing.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
