//! Fleet management: instance provisioning, draining and request allocation

pub mod manager;

pub use manager::{
    AllocationOutcome, FleetConfig, InstanceManager, ReconcileOutcome, TickOutcome,
};
