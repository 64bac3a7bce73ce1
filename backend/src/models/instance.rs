//! Instance model
//!
//! One AMF control-plane node. Each instance has:
//! - A fixed capacity (maximum concurrent requests when fully ON)
//! - An admission limit that shrinks while the instance drains
//! - A life budget consumed while ON; exhausting it starts a graduated shutdown
//! - The set of requests it is currently serving
//!
//! # Lifecycle
//!
//! ```text
//! OFF ──activate──▶ ON ──life ≤ 0──▶ SHUTTING_DOWN(phase 1)
//!                                        │ deadline
//!                                        ▼
//!                   OFF ◀──deadline── SHUTTING_DOWN(phase 2)
//! ```
//!
//! Draining instances keep serving: their admission limit drops to a small
//! fraction of capacity per phase, and requests already above the new limit
//! are not evicted.

use crate::core::time::SimTime;
use crate::models::request::{Request, RequestId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Instance identifier, equal to the instance's position in the fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub usize);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceState {
    Off,
    On,
    ShuttingDown,
}

impl InstanceState {
    /// Upper-case label used in state logs
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Off => "OFF",
            InstanceState::On => "ON",
            InstanceState::ShuttingDown => "SHUTTING_DOWN",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drain phase of a SHUTTING_DOWN instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShutdownPhase {
    Phase1,
    Phase2,
}

impl ShutdownPhase {
    /// Phase number (1 or 2)
    pub fn number(&self) -> u8 {
        match self {
            ShutdownPhase::Phase1 => 1,
            ShutdownPhase::Phase2 => 2,
        }
    }
}

/// Parameters of the graduated shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainSchedule {
    /// Time spent in each shutdown phase
    pub drain_duration: SimTime,
    /// Admission limit in phase 1, as a percentage of capacity
    pub phase1_admission_pct: u32,
    /// Admission limit in phase 2, as a percentage of capacity
    pub phase2_admission_pct: u32,
}

impl Default for DrainSchedule {
    fn default() -> Self {
        Self {
            drain_duration: 10,
            phase1_admission_pct: 5,
            phase2_admission_pct: 1,
        }
    }
}

impl DrainSchedule {
    /// Admission limit of an instance of `capacity` in `phase` (rounded down)
    ///
    /// # Example
    /// ```
    /// use amf_simulator_core::{DrainSchedule, ShutdownPhase};
    ///
    /// let drain = DrainSchedule::default();
    /// assert_eq!(drain.admission_limit(12_000, ShutdownPhase::Phase1), 600);
    /// assert_eq!(drain.admission_limit(12_000, ShutdownPhase::Phase2), 120);
    /// assert_eq!(drain.admission_limit(150, ShutdownPhase::Phase2), 1);
    /// ```
    pub fn admission_limit(&self, capacity: u32, phase: ShutdownPhase) -> u32 {
        let pct = match phase {
            ShutdownPhase::Phase1 => self.phase1_admission_pct,
            ShutdownPhase::Phase2 => self.phase2_admission_pct,
        };
        (u64::from(capacity) * u64::from(pct) / 100) as u32
    }
}

/// A lifecycle transition applied by [`Instance::evaluate_shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleTransition {
    /// ON → SHUTTING_DOWN (phase 1)
    ShutdownStarted,
    /// Phase 1 → phase 2
    DrainPhaseAdvanced,
    /// Phase 2 → OFF
    Stopped,
}

/// One control-plane instance
///
/// # Example
/// ```
/// use amf_simulator_core::{Instance, InstanceId, InstanceState, Request, RequestId};
///
/// let mut amf = Instance::new(InstanceId(0), 2);
/// assert_eq!(amf.state(), InstanceState::Off);
///
/// amf.activate(2.0);
/// assert!(amf.admit(Request::new(RequestId(1), InstanceId(0), 0, 9)));
/// assert!(amf.admit(Request::new(RequestId(2), InstanceId(0), 0, 9)));
/// assert!(!amf.admit(Request::new(RequestId(3), InstanceId(0), 0, 9)));
///
/// assert!(amf.release(RequestId(1)));
/// assert!(!amf.release(RequestId(1))); // already released
/// assert_eq!(amf.active_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,

    /// Maximum concurrent requests when fully ON
    capacity: u32,

    /// Current maximum concurrent requests (≤ capacity)
    admission_limit: u32,

    /// Remaining life budget; infinite only for the seed instance
    life: f64,

    state: InstanceState,

    /// Set only while SHUTTING_DOWN
    shutdown_phase: Option<ShutdownPhase>,

    /// End of the current shutdown phase
    shutdown_deadline: Option<SimTime>,

    /// Scheduled activation time of a freshly created, still OFF instance
    activates_at: Option<SimTime>,

    active_requests: BTreeMap<RequestId, Request>,
}

impl Instance {
    /// Create a dormant (OFF) instance
    pub fn new(id: InstanceId, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            admission_limit: capacity,
            life: 0.0,
            state: InstanceState::Off,
            shutdown_phase: None,
            shutdown_deadline: None,
            activates_at: None,
            active_requests: BTreeMap::new(),
        }
    }

    /// Create an OFF instance that will be activated at `activates_at`
    pub fn provisioning(id: InstanceId, capacity: u32, activates_at: SimTime) -> Self {
        Self {
            activates_at: Some(activates_at),
            ..Self::new(id, capacity)
        }
    }

    /// OFF → ON with the given life budget
    ///
    /// Returns `false` (and changes nothing) if the instance is not OFF.
    pub fn activate(&mut self, life: f64) -> bool {
        if self.state != InstanceState::Off {
            return false;
        }
        self.state = InstanceState::On;
        self.admission_limit = self.capacity;
        self.life = life;
        self.activates_at = None;
        true
    }

    /// Consume `damage` life if ON
    pub fn age(&mut self, damage: f64) {
        if self.state == InstanceState::On {
            self.life -= damage;
        }
    }

    /// Give back `amount` life, never exceeding `ceiling`
    ///
    /// An infinite life stays infinite.
    pub fn restore_life(&mut self, amount: f64, ceiling: f64) {
        if self.life.is_finite() {
            self.life = (self.life + amount).min(ceiling);
        }
    }

    /// Raise a negative life budget back to zero
    pub fn clamp_life_non_negative(&mut self) {
        self.life = self.life.max(0.0);
    }

    /// Apply at most one shutdown transition due at `now`
    pub fn evaluate_shutdown(
        &mut self,
        now: SimTime,
        drain: &DrainSchedule,
    ) -> Option<LifecycleTransition> {
        match (self.state, self.shutdown_phase) {
            (InstanceState::On, _) if self.life <= 0.0 => {
                self.state = InstanceState::ShuttingDown;
                self.enter_phase(ShutdownPhase::Phase1, now, drain);
                Some(LifecycleTransition::ShutdownStarted)
            }
            (InstanceState::ShuttingDown, Some(ShutdownPhase::Phase1))
                if self.deadline_reached(now) =>
            {
                self.enter_phase(ShutdownPhase::Phase2, now, drain);
                Some(LifecycleTransition::DrainPhaseAdvanced)
            }
            (InstanceState::ShuttingDown, Some(ShutdownPhase::Phase2))
                if self.deadline_reached(now) =>
            {
                self.turn_off();
                Some(LifecycleTransition::Stopped)
            }
            _ => None,
        }
    }

    fn enter_phase(&mut self, phase: ShutdownPhase, now: SimTime, drain: &DrainSchedule) {
        self.shutdown_phase = Some(phase);
        self.admission_limit = drain.admission_limit(self.capacity, phase);
        self.shutdown_deadline = Some(now.saturating_add(drain.drain_duration));
    }

    fn deadline_reached(&self, now: SimTime) -> bool {
        self.shutdown_deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Retire the instance; requests still executing are abandoned with it
    fn turn_off(&mut self) {
        self.active_requests.clear();
        self.state = InstanceState::Off;
        self.shutdown_phase = None;
        self.shutdown_deadline = None;
        self.admission_limit = self.capacity;
    }

    /// Admit `request` if serving and below the admission limit
    pub fn admit(&mut self, request: Request) -> bool {
        if !self.has_headroom() {
            return false;
        }
        self.active_requests.insert(request.id(), request);
        true
    }

    /// Release a request; returns `false` if it was not active here
    pub fn release(&mut self, request_id: RequestId) -> bool {
        self.active_requests.remove(&request_id).is_some()
    }

    /// ON or SHUTTING_DOWN
    pub fn is_serving(&self) -> bool {
        matches!(self.state, InstanceState::On | InstanceState::ShuttingDown)
    }

    /// Serving with at least one free admission slot
    pub fn has_headroom(&self) -> bool {
        self.is_serving() && self.active_count() < self.admission_limit as usize
    }

    /// Free admission slots (0 when not serving or over the limit)
    pub fn headroom(&self) -> usize {
        if self.is_serving() {
            (self.admission_limit as usize).saturating_sub(self.active_count())
        } else {
            0
        }
    }

    pub fn is_pending_activation(&self) -> bool {
        self.activates_at.is_some()
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn admission_limit(&self) -> u32 {
        self.admission_limit
    }

    pub fn life(&self) -> f64 {
        self.life
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn shutdown_phase(&self) -> Option<ShutdownPhase> {
        self.shutdown_phase
    }

    pub fn shutdown_deadline(&self) -> Option<SimTime> {
        self.shutdown_deadline
    }

    pub fn activates_at(&self) -> Option<SimTime> {
        self.activates_at
    }

    pub fn active_count(&self) -> usize {
        self.active_requests.len()
    }

    /// Iterate over active requests in id order
    pub fn active_requests(&self) -> impl Iterator<Item = &Request> {
        self.active_requests.values()
    }
}
