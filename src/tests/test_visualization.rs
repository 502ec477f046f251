use std::fs;
use tempfile::tempdir;
use crate::artifacts::{RunArtifacts, RunId};
use crate::config::TrainingConfig;
use crate::metrics::{EpisodeTracker, TrainingHistory};
use crate::visualization::{
    export_rewards_csv, history_summary, plot_reward_history, plot_rewards_png, render_series,
    training_progress,
};

fn history(rewards: &[f32]) -> TrainingHistory {
    let mut history = TrainingHistory::new();
    for (i, &reward) in rewards.iter().enumerate() {
        let mut tracker = EpisodeTracker::new();
        tracker.step(reward);
        tracker.record_loss(0.5);
        history.push(tracker.finish(i + 1, 0.9));
    }
    history
}

#[test]
fn test_rewards_csv_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("rewards.csv");

    export_rewards_csv(&history(&[-120.5, -80.0, -95.25]), &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["Episode,TotalReward", "1,-120.5", "2,-80", "3,-95.25"]);
}

#[test]
fn test_reward_png_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plot.png");

    plot_rewards_png(&history(&[-10.0, -4.0, -6.0, -1.0]), &path, 320, 200).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_render_series() {
    let image = render_series(&[1.0, 3.0, 2.0], 200, 120).unwrap();
    assert_eq!(image.dimensions(), (200, 120));
    // corners stay background
    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
    // first point lands on the left edge of the plot area at the minimum
    assert_ne!(image.get_pixel(40, 80).0, [255, 255, 255]);

    // flat and single-point series still render
    assert!(render_series(&[-5.0], 200, 120).is_ok());
    assert!(render_series(&[2.0, 2.0], 200, 120).is_ok());

    assert!(render_series(&[], 200, 120).is_err());
    assert!(render_series(&[1.0, f32::NAN], 200, 120).is_err());
    assert!(render_series(&[1.0, 2.0], 50, 50).is_err());
}

#[test]
fn test_text_plots() {
    let plot = plot_reward_history(&history(&[-3.0, -1.0, -2.0]), 30, 8);
    assert!(plot.starts_with("Episode Rewards"));
    assert!(plot.contains("Points: 3"));

    assert_eq!(plot_reward_history(&TrainingHistory::new(), 30, 8), "No reward data available");

    let line = training_progress(1, 2, -3.0, 0.5);
    assert!(line.contains("Episode 1/2"));
    assert!(line.contains("50.0%"));

    let summary = history_summary(&history(&[-3.0, -1.0]));
    assert!(summary.contains("Best=-1.00"));
    assert!(summary.contains("Episodes: 2"));
}

#[test]
fn test_history_stats_and_json() {
    let dir = tempdir().unwrap();
    let history = history(&[-4.0, -2.0, -6.0]);

    assert_eq!(history.rewards(), vec![-4.0, -2.0, -6.0]);
    assert_eq!(history.avg_reward(2), Some(-4.0));
    assert_eq!(history.best_reward(), Some(-2.0));
    assert_eq!(history.total_steps(), 3);
    assert_eq!(history.last().unwrap().mean_loss, Some(0.5));

    let path = dir.path().join("history.json");
    history.save_json(&path).unwrap();
    assert_eq!(TrainingHistory::load_json(&path).unwrap(), history);
}

#[test]
fn test_artifact_paths() {
    let config = TrainingConfig::default();
    let artifacts = RunArtifacts::new(RunId::from("20240101-120000"), &config);

    assert_eq!(
        artifacts.checkpoint(5).to_str().unwrap(),
        "models/run_20240101-120000_episode_5.bin"
    );
    assert_eq!(artifacts.rewards_csv().to_str().unwrap(), "logs/rewards_20240101-120000.csv");
    assert_eq!(artifacts.reward_plot().to_str().unwrap(), "logs/plot_20240101-120000.png");

    let id = RunId::now();
    assert_eq!(id.as_str().len(), 15);
    assert_eq!(id.as_str().as_bytes()[8], b'-');
}
