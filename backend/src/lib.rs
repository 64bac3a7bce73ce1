//! AMF Simulator Core - Rust Engine
//!
//! Discrete-event simulation of a pool of AMF control-plane instances under
//! time-varying load, used to compare forecast-driven and ideal autoscaling.
//!
//! # Architecture
//!
//! - **core**: Tick clock and event timeline
//! - **models**: Domain types (Instance, Request, LoadSample, Event)
//! - **policy**: Capacity planning and provisioning mode
//! - **fleet**: Instance manager (aging, reconciliation, allocation)
//! - **metrics**: Run-scoped tick records
//! - **orchestrator**: Single-run event loop, state log, run report
//! - **io**: Dataset loading and result export
//!
//! # Critical Invariants
//!
//! 1. Runs are deterministic: events fire in (time, scheduling order)
//! 2. No state is shared between runs
//! 3. Admission failures are counted, never raised as errors

// Module declarations
pub mod core;
pub mod events;
pub mod fleet;
pub mod io;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod policy;

// Re-exports for convenience
pub use crate::core::time::{SimTime, TickClock};
pub use crate::core::timeline::{ScheduleError, Timeline};
pub use fleet::{FleetConfig, InstanceManager};
pub use metrics::{RunMetrics, TickRecord};
pub use models::{
    event::{Event, EventLog},
    instance::{DrainSchedule, Instance, InstanceId, InstanceState, ShutdownPhase},
    load::LoadSample,
    request::{Request, RequestId},
};
pub use orchestrator::{
    run_simulation, Orchestrator, RunReport, RunSummary, SimulationConfig, SimulationError,
};
pub use policy::{required_instances, ProvisioningMode};
