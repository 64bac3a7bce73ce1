//! Orchestrator - single-run simulation driver
//!
//! See `engine.rs` for the event loop, `snapshot.rs` for the state log and
//! digests, `report.rs` for run results.

pub mod engine;
pub mod report;
pub mod snapshot;

// Re-export main types for convenience
pub use engine::{run_simulation, Orchestrator, SimulationConfig, SimulationError};
pub use report::{RunReport, RunSummary};
pub use snapshot::{
    compute_config_hash, compute_run_digest, FleetSnapshot, InstanceSnapshot, StateLog,
};
