// Test modules for all components
pub mod test_activations;
pub mod test_agent;
pub mod test_optimizer;
pub mod test_replay_buffer;
pub mod test_sumo;
pub mod test_visualization;
