pub mod export;
pub mod text_plots;

pub use export::{export_rewards_csv, plot_rewards_png, render_series};
pub use text_plots::{history_summary, plot_reward_history, plot_series, training_progress};
