pub mod tracker;

pub use tracker::{EpisodeRecord, EpisodeTracker, TrainingHistory};
