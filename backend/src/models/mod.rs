//! Domain models for the AMF simulator

pub mod event;
pub mod instance;
pub mod load;
pub mod request;

// Re-exports
pub use event::{Event, EventLog};
pub use instance::{
    DrainSchedule, Instance, InstanceId, InstanceState, LifecycleTransition, ShutdownPhase,
};
pub use load::LoadSample;
pub use request::{Request, RequestId};
