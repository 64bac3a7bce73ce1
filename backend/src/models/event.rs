//! Lifecycle event logging for auditing and analysis.
//!
//! This module defines the Event enum which captures every fleet-level state
//! change during a run:
//! - **Provisioning**: instance created (seeded, scaled up, or forced) and activated
//! - **Draining**: shutdown started, drain phase advanced, instance stopped
//! - **Admission**: requests dropped because no instance had headroom
//!
//! Per-request admissions and completions are deliberately not logged; they
//! are visible in aggregate through tick records.
//!
//! # Example
//!
//! ```rust
//! use amf_simulator_core::models::{Event, EventLog};
//! use amf_simulator_core::InstanceId;
//!
//! let mut log = EventLog::new();
//! log.log(Event::ShutdownStarted { time: 20, instance_id: InstanceId(3) });
//!
//! assert_eq!(log.events_at_time(20).len(), 1);
//! assert_eq!(log.events_for_instance(InstanceId(3)).len(), 1);
//! ```

use crate::core::time::SimTime;
use crate::models::instance::InstanceId;
use serde::{Deserialize, Serialize};

/// Simulation event capturing a fleet state change.
///
/// Events are logged in the order they occur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Instance appended to the fleet
    InstanceCreated {
        time: SimTime,
        instance_id: InstanceId,
        /// Created before the first tick
        seed: bool,
        /// Created by the safety net because no instance was ON
        forced: bool,
    },

    /// Instance turned ON
    InstanceActivated {
        time: SimTime,
        instance_id: InstanceId,
    },

    /// Instance exhausted its life and entered drain phase 1
    ShutdownStarted {
        time: SimTime,
        instance_id: InstanceId,
    },

    /// Instance moved from drain phase 1 to phase 2
    DrainPhaseAdvanced {
        time: SimTime,
        instance_id: InstanceId,
    },

    /// Instance finished draining and is OFF
    InstanceStopped {
        time: SimTime,
        instance_id: InstanceId,
    },

    /// Requests that found no instance with headroom during a tick
    RequestsDropped { time: SimTime, count: u64 },
}

impl Event {
    /// Get the simulated time when this event occurred
    pub fn time(&self) -> SimTime {
        match self {
            Event::InstanceCreated { time, .. } => *time,
            Event::InstanceActivated { time, .. } => *time,
            Event::ShutdownStarted { time, .. } => *time,
            Event::DrainPhaseAdvanced { time, .. } => *time,
            Event::InstanceStopped { time, .. } => *time,
            Event::RequestsDropped { time, .. } => *time,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::InstanceCreated { .. } => "InstanceCreated",
            Event::InstanceActivated { .. } => "InstanceActivated",
            Event::ShutdownStarted { .. } => "ShutdownStarted",
            Event::DrainPhaseAdvanced { .. } => "DrainPhaseAdvanced",
            Event::InstanceStopped { .. } => "InstanceStopped",
            Event::RequestsDropped { .. } => "RequestsDropped",
        }
    }

    /// Get the instance ID if the event relates to a specific instance
    pub fn instance_id(&self) -> Option<InstanceId> {
        match self {
            Event::InstanceCreated { instance_id, .. } => Some(*instance_id),
            Event::InstanceActivated { instance_id, .. } => Some(*instance_id),
            Event::ShutdownStarted { instance_id, .. } => Some(*instance_id),
            Event::DrainPhaseAdvanced { instance_id, .. } => Some(*instance_id),
            Event::InstanceStopped { instance_id, .. } => Some(*instance_id),
            Event::RequestsDropped { .. } => None,
        }
    }
}

/// Event log for storing and querying lifecycle events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events that occurred at a specific time
    pub fn events_at_time(&self, time: SimTime) -> Vec<&Event> {
        self.events.iter().filter(|e| e.time() == time).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific instance
    pub fn events_for_instance(&self, instance_id: InstanceId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.instance_id() == Some(instance_id))
            .collect()
    }
}
