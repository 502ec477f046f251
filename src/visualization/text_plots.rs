use crate::metrics::TrainingHistory;

/// Plot total reward per episode as ASCII art
pub fn plot_reward_history(history: &TrainingHistory, width: usize, height: usize) -> String {
    if history.is_empty() {
        return "No reward data available".to_string();
    }
    plot_series(&history.rewards(), "Episode Rewards", width, height)
}

/// Generic series plotter
pub fn plot_series(values: &[f32], title: &str, width: usize, height: usize) -> String {
    if values.is_empty() || width < 10 || height < 5 {
        return format!("{}: Invalid data or dimensions", title);
    }

    let min_val = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max_val = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if (max_val - min_val).abs() < f32::EPSILON {
        return format!("{}: All values are {:.4}", title, min_val);
    }

    let mut plot = vec![vec![' '; width]; height];
    for row in plot.iter_mut() {
        row[0] = '|';
    }
    for cell in plot[height - 1].iter_mut() {
        *cell = '-';
    }
    plot[height - 1][0] = '+';

    let columns = (width - 3) as f32;
    let rows = (height - 3) as f32;
    let last = (values.len() - 1).max(1) as f32;

    for (i, &value) in values.iter().enumerate() {
        let x = ((i as f32 / last * columns) as usize + 2).min(width - 1);
        let level = ((value - min_val) / (max_val - min_val) * rows) as usize;
        let y = (height - 3).saturating_sub(level).min(height - 2);
        plot[y][x] = '*';
    }

    let mut output = format!("{}\n", title);
    output.push_str(&format!("Max: {:.4}\n", max_val));
    for row in &plot {
        output.push_str(&row.iter().collect::<String>());
        output.push('\n');
    }
    output.push_str(&format!("Min: {:.4}\n", min_val));
    output.push_str(&format!("Points: {}\n", values.len()));
    output
}

/// One-line progress report for an episode
pub fn training_progress(episode: usize, total_episodes: usize, reward: f32, epsilon: f32) -> String {
    let progress = if total_episodes == 0 {
        1.0
    } else {
        (episode as f32 / total_episodes as f32).min(1.0)
    };
    let bar_length = 30;
    let filled = (progress * bar_length as f32) as usize;
    let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(bar_length - filled));

    format!(
        "Episode {}/{} {} {:.1}% | Total Reward: {:.2} | Epsilon: {:.3}",
        episode,
        total_episodes,
        bar,
        progress * 100.0,
        reward,
        epsilon
    )
}

/// Summary table of a finished run
pub fn history_summary(history: &TrainingHistory) -> String {
    let mut output = String::new();
    output.push_str("Training Summary\n");
    output.push_str("================\n");

    let Some(last) = history.last() else {
        output.push_str("No episodes completed\n");
        return output;
    };

    output.push_str(&format!("Episodes: {}, Decision steps: {}\n", history.len(), history.total_steps()));
    output.push_str(&format!(
        "Rewards: Final={:.2}, Average={:.2}, Best={:.2}\n",
        last.total_reward,
        history.avg_reward(history.len()).unwrap_or(0.0),
        history.best_reward().unwrap_or(0.0)
    ));
    output.push_str(&format!("Final epsilon: {:.4}\n", last.epsilon));
    if let Some(loss) = last.mean_loss {
        output.push_str(&format!("Last episode mean loss: {:.4}\n", loss));
    }
    output
}
