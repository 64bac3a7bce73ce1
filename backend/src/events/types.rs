//! Event types dispatched by the run timeline
//!
//! # Design Principles
//!
//! 1. **Determinism**: events fire in (time, scheduling order); nothing else
//!    decides what runs next
//! 2. **Self-contained**: each event carries the ids it needs, never references
//! 3. **Bounded**: events at or past the run horizon are simply never dispatched

use crate::models::{InstanceId, RequestId};
use serde::{Deserialize, Serialize};

/// An event waiting on the run timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Sample load, reconcile the fleet and admit requests for dataset row `index`
    Tick { index: usize },

    /// Activation delay of a newly created instance has elapsed
    Activate { instance_id: InstanceId },

    /// A request finished executing and frees its slot
    CompleteRequest {
        instance_id: InstanceId,
        request_id: RequestId,
    },
}

impl SimEvent {
    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            SimEvent::Tick { .. } => "Tick",
            SimEvent::Activate { .. } => "Activate",
            SimEvent::CompleteRequest { .. } => "CompleteRequest",
        }
    }
}
