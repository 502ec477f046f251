//! # signalq
//!
//! Train the double-DQN traffic signal controller against SUMO, then write the
//! per-episode rewards as CSV and PNG next to the checkpoints.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signalq::agent::DqnAgent;
use signalq::artifacts::{RunArtifacts, RunId};
use signalq::config::Config;
use signalq::environment::{IntersectionEnv, SteppableEnvironment};
use signalq::simulator::SumoSession;
use signalq::training::Trainer;
use signalq::visualization::{export_rewards_csv, history_summary, plot_reward_history, plot_rewards_png};

const PLOT_WIDTH: u32 = 1000;
const PLOT_HEIGHT: u32 = 500;

#[derive(Parser)]
#[command(name = "signalq", about = "Double-DQN traffic signal control with SUMO")]
struct Args {
    /// JSON run configuration; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the number of training episodes
    #[arg(long)]
    episodes: Option<usize>,
    /// Launch sumo-gui instead of headless sumo
    #[arg(long, default_value_t = false)]
    gui: bool,
    /// Start from a saved checkpoint
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Log filter, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(episodes) = args.episodes {
        config.training.episodes = episodes;
    }
    if args.gui {
        config.environment.use_gui = true;
    }
    config.validate().context("invalid configuration")?;

    let run_id = RunId::now();
    info!(%run_id, "starting new training run");
    let artifacts = RunArtifacts::new(run_id, &config.training);

    let mut agent = DqnAgent::new(&config.agent)?;
    let mut trainer = Trainer::new(config.training.clone(), artifacts.clone())?;
    if let Some(checkpoint) = args.resume {
        trainer = trainer.resume_from(checkpoint);
    }

    let session = SumoSession::start(&config.environment).context("starting SUMO")?;
    let mut env = IntersectionEnv::new(session, config.environment.clone())?;

    let outcome = trainer.run(&mut agent, &mut env);
    if let Err(e) = env.close() {
        warn!(error = %e, "closing the simulator failed");
    }
    let history = outcome.context("training aborted")?;

    info!("training finished, saving results");
    let csv_path = artifacts.rewards_csv();
    export_rewards_csv(&history, &csv_path)?;
    info!(path = %csv_path.display(), "reward data saved");

    let history_path = artifacts.history_json();
    history.save_json(&history_path)?;

    if history.is_empty() {
        warn!("no episodes ran, skipping reward plot");
    } else {
        let plot_path = artifacts.reward_plot();
        plot_rewards_png(&history, &plot_path, PLOT_WIDTH, PLOT_HEIGHT)?;
        info!(path = %plot_path.display(), "reward plot saved");
    }

    info!("\n{}", plot_reward_history(&history, 60, 15));
    info!("\n{}", history_summary(&history));
    Ok(())
}
