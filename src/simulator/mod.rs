//! # Simulator Session
//!
//! The narrow, synchronous surface the environment adapter needs from a
//! traffic micro-simulator. [`TraciClient`] speaks SUMO's TraCI protocol over
//! a socket; [`SumoSession`] launches the SUMO process, owns the client, and
//! guarantees the process is shut down when the session goes away.

pub mod protocol;
pub mod sumo;
pub mod traci;

pub use sumo::SumoSession;
pub use traci::TraciClient;

use crate::error::Result;

/// Commands the environment adapter issues against a running simulation.
///
/// Every call blocks until the simulator has answered.
pub trait SimulatorSession {
    /// Reload the simulation with `args` and rewind it to its starting state.
    fn load(&mut self, args: &[String]) -> Result<()>;

    /// Advance the simulation by one tick.
    fn simulation_step(&mut self) -> Result<()>;

    /// Vehicles halted on `lane` during the last tick.
    fn lane_halting_number(&mut self, lane: &str) -> Result<u32>;

    /// Accumulated waiting time of the vehicles on `lane`, in seconds.
    fn lane_waiting_time(&mut self, lane: &str) -> Result<f64>;

    /// Switch traffic light `tls_id` to phase `index` of its current program.
    fn set_phase(&mut self, tls_id: &str, index: u32) -> Result<()>;

    /// End the session. Calling it again is a no-op.
    fn close(&mut self) -> Result<()>;
}
