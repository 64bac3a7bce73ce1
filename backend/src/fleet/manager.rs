//! Instance manager
//!
//! Owns the fleet and runs the per-tick control loop:
//!
//! ```text
//! For each tick at time t:
//! 1. Age: ON instances lose `damage` life; shutdown transitions due at t apply
//! 2. Reconcile: grow the fleet up to the required count, or let the excess age out
//! 3. Allocate: admit the tick's real requests round-robin; drop what does not fit
//! ```
//!
//! # Critical Invariants
//!
//! 1. **Append-only fleet**: instances are retired by state, never removed,
//!    so an `InstanceId` is a stable index
//! 2. **Single seed**: only the first seed instance has infinite life
//! 3. **Liveness**: after reconciliation at least one instance is ON
//! 4. **Admission bound**: no instance admits beyond its admission limit

use crate::core::time::SimTime;
use crate::core::timeline::{ScheduleError, Timeline};
use crate::events::SimEvent;
use crate::metrics::percentage;
use crate::models::event::{Event, EventLog};
use crate::models::instance::{
    DrainSchedule, Instance, InstanceId, InstanceState, LifecycleTransition,
};
use crate::models::request::{Request, RequestId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Parameters of the fleet and its instances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Per-instance capacity
    pub instance_capacity: u32,

    /// Life budget of every non-seed instance at activation
    pub initial_life: f64,

    /// Life an ON instance loses per tick
    pub damage: f64,

    /// Delay between creating an instance and turning it ON
    pub activation_delay: SimTime,

    /// Execution time of every request
    pub request_duration: SimTime,

    /// Graduated shutdown parameters
    pub drain: DrainSchedule,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            instance_capacity: 12_000,
            initial_life: 2.0,
            damage: 1.0,
            activation_delay: 0,
            request_duration: 9,
            drain: DrainSchedule::default(),
        }
    }
}

/// What reconciliation did in one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Instances created to meet the required count
    pub created: usize,

    /// Replacement created because no instance was left ON
    pub forced: bool,
}

/// What allocation did in one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationOutcome {
    pub admitted: u64,
    pub unallocated: u64,
}

/// Combined result of one tick of fleet management
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub required: usize,
    pub reconcile: ReconcileOutcome,
    pub allocation: AllocationOutcome,
}

/// Owner of the instance fleet
///
/// # Example
///
/// ```rust
/// use amf_simulator_core::fleet::{FleetConfig, InstanceManager};
/// use amf_simulator_core::Timeline;
///
/// let mut timeline = Timeline::new();
/// let mut manager = InstanceManager::new(FleetConfig::default());
/// manager.seed(1, 0);
///
/// let outcome = manager.process_tick(1, 5_000, 0, &mut timeline).unwrap();
/// assert_eq!(outcome.allocation.admitted, 5_000);
/// assert_eq!(outcome.allocation.unallocated, 0);
/// assert_eq!(manager.on_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct InstanceManager {
    config: FleetConfig,

    /// Append-only, in creation order
    instances: Vec<Instance>,

    /// Index of the instance that received the last request
    last_assigned: Option<usize>,

    next_request_id: u64,

    events: EventLog,
}

impl InstanceManager {
    pub fn new(config: FleetConfig) -> Self {
        Self {
            config,
            instances: Vec::new(),
            last_assigned: None,
            next_request_id: 0,
            events: EventLog::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.0)
    }

    /// Instances ON or SHUTTING_DOWN
    pub fn active_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_serving()).count()
    }

    /// Instances strictly ON
    pub fn on_count(&self) -> usize {
        self.count_in(InstanceState::On)
    }

    /// Instances created but not yet activated
    pub fn pending_count(&self) -> usize {
        self.instances
            .iter()
            .filter(|i| i.is_pending_activation())
            .count()
    }

    /// Free admission slots across the fleet
    pub fn total_headroom(&self) -> usize {
        self.instances.iter().map(Instance::headroom).sum()
    }

    /// `Σ active / Σ admission limit × 100` over serving instances
    pub fn utilization_pct(&self) -> f64 {
        let (active, limit) = self
            .instances
            .iter()
            .filter(|i| i.is_serving())
            .fold((0u64, 0u64), |(active, limit), i| {
                (
                    active + i.active_count() as u64,
                    limit + u64::from(i.admission_limit()),
                )
            });
        percentage(active as f64, limit as f64)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Consume the manager, keeping only its lifecycle event log
    pub fn into_events(self) -> EventLog {
        self.events
    }

    fn count_in(&self, state: InstanceState) -> usize {
        self.instances.iter().filter(|i| i.state() == state).count()
    }

    // ========================================================================
    // Provisioning
    // ========================================================================

    /// Add `count` instances that are ON immediately
    ///
    /// The first seed instance of the fleet gets infinite life; any others get
    /// the configured initial life.
    pub fn seed(&mut self, count: usize, now: SimTime) {
        for _ in 0..count {
            let life = if self.instances.is_empty() {
                f64::INFINITY
            } else {
                self.config.initial_life
            };
            let id = self.push_instance(now, true, false);
            self.turn_on(id, life, now);
        }
    }

    /// Create one instance, honoring the activation delay unless `forced`
    fn create_instance(
        &mut self,
        now: SimTime,
        forced: bool,
        timeline: &mut Timeline<SimEvent>,
    ) -> Result<InstanceId, ScheduleError> {
        let delay = self.config.activation_delay;
        if forced || delay == 0 {
            let id = self.push_instance(now, false, forced);
            self.turn_on(id, self.config.initial_life, now);
            return Ok(id);
        }

        let activates_at = now.saturating_add(delay);
        let id = InstanceId(self.instances.len());
        timeline.schedule(SimEvent::Activate { instance_id: id }, activates_at)?;
        self.instances.push(Instance::provisioning(
            id,
            self.config.instance_capacity,
            activates_at,
        ));
        self.log_created(id, now, false, false);
        Ok(id)
    }

    fn push_instance(&mut self, now: SimTime, seed: bool, forced: bool) -> InstanceId {
        let id = InstanceId(self.instances.len());
        self.instances
            .push(Instance::new(id, self.config.instance_capacity));
        self.log_created(id, now, seed, forced);
        id
    }

    fn log_created(&mut self, id: InstanceId, now: SimTime, seed: bool, forced: bool) {
        debug!(instance = %id, time = now, seed, forced, "instance created");
        self.events.log(Event::InstanceCreated {
            time: now,
            instance_id: id,
            seed,
            forced,
        });
    }

    fn turn_on(&mut self, id: InstanceId, life: f64, now: SimTime) {
        if let Some(instance) = self.instances.get_mut(id.0) {
            if instance.activate(life) {
                debug!(instance = %id, time = now, "instance activated");
                self.events.log(Event::InstanceActivated {
                    time: now,
                    instance_id: id,
                });
            }
        }
    }

    /// Handle an elapsed activation delay
    pub fn activate(&mut self, id: InstanceId, now: SimTime) {
        self.turn_on(id, self.config.initial_life, now);
    }

    // ========================================================================
    // Tick Loop Implementation
    // ========================================================================

    /// Run one tick: age, reconcile to `required`, then allocate `real_requests`
    pub fn process_tick(
        &mut self,
        required: usize,
        real_requests: u64,
        now: SimTime,
        timeline: &mut Timeline<SimEvent>,
    ) -> Result<TickOutcome, ScheduleError> {
        self.age(now);
        let reconcile = self.reconcile(required, now, timeline)?;
        let allocation = self.allocate(real_requests, now, timeline)?;
        Ok(TickOutcome {
            required,
            reconcile,
            allocation,
        })
    }

    /// Consume life of ON instances and apply due shutdown transitions
    pub fn age(&mut self, now: SimTime) {
        let damage = self.config.damage;
        let drain = self.config.drain;
        for instance in &mut self.instances {
            instance.age(damage);
            if !instance.is_serving() {
                continue;
            }
            let Some(transition) = instance.evaluate_shutdown(now, &drain) else {
                continue;
            };
            let instance_id = instance.id();
            let event = match transition {
                LifecycleTransition::ShutdownStarted => {
                    debug!(instance = %instance_id, time = now, "draining (phase 1)");
                    Event::ShutdownStarted {
                        time: now,
                        instance_id,
                    }
                }
                LifecycleTransition::DrainPhaseAdvanced => {
                    debug!(instance = %instance_id, time = now, "draining (phase 2)");
                    Event::DrainPhaseAdvanced {
                        time: now,
                        instance_id,
                    }
                }
                LifecycleTransition::Stopped => {
                    debug!(instance = %instance_id, time = now, "instance stopped");
                    Event::InstanceStopped {
                        time: now,
                        instance_id,
                    }
                }
            };
            self.events.log(event);
        }
    }

    /// Bring the fleet in line with `required` instances
    ///
    /// Scaling up creates instances and pays back this tick's aging on every
    /// ON instance. Holding steady pays back every ON instance. Scaling down
    /// pays back only the first `required` ON instances; the rest keep aging
    /// and drain through the shutdown state machine.
    pub fn reconcile(
        &mut self,
        required: usize,
        now: SimTime,
        timeline: &mut Timeline<SimEvent>,
    ) -> Result<ReconcileOutcome, ScheduleError> {
        let damage = self.config.damage;
        let ceiling = self.config.initial_life;
        let provisioned = self.on_count() + self.pending_count();

        let mut kept = 0;
        for instance in &mut self.instances {
            if instance.state() != InstanceState::On {
                continue;
            }
            if kept < required || required >= provisioned {
                instance.restore_life(damage, ceiling);
            } else {
                instance.clamp_life_non_negative();
            }
            kept += 1;
        }

        let mut outcome = ReconcileOutcome::default();
        for _ in provisioned..required {
            self.create_instance(now, false, timeline)?;
            outcome.created += 1;
        }

        if self.on_count() == 0 {
            warn!(time = now, "no instance ON after reconciliation, forcing a replacement");
            self.create_instance(now, true, timeline)?;
            outcome.forced = true;
        }

        Ok(outcome)
    }

    /// Admit `count` requests round-robin; requests that fit nowhere are dropped
    ///
    /// Each request scans the fleet at most once, starting just after the
    /// instance that received the previous request.
    pub fn allocate(
        &mut self,
        count: u64,
        now: SimTime,
        timeline: &mut Timeline<SimEvent>,
    ) -> Result<AllocationOutcome, ScheduleError> {
        let mut outcome = AllocationOutcome::default();
        let fleet_size = self.instances.len();
        let mut headroom = self.total_headroom();

        for _ in 0..count {
            if headroom == 0 {
                break;
            }
            let start = self.last_assigned.map_or(0, |last| (last + 1) % fleet_size);
            let Some(index) = (0..fleet_size)
                .map(|offset| (start + offset) % fleet_size)
                .find(|&index| self.instances[index].has_headroom())
            else {
                break;
            };

            let request = self.new_request(InstanceId(index), now);
            let completion = SimEvent::CompleteRequest {
                instance_id: request.instance_id(),
                request_id: request.id(),
            };
            let completes_at = request.completion_time();
            if self.instances[index].admit(request) {
                timeline.schedule(completion, completes_at)?;
                self.last_assigned = Some(index);
                outcome.admitted += 1;
                headroom -= 1;
            }
        }

        outcome.unallocated = count - outcome.admitted;
        if outcome.unallocated > 0 {
            warn!(time = now, dropped = outcome.unallocated, "requests dropped");
            self.events.log(Event::RequestsDropped {
                time: now,
                count: outcome.unallocated,
            });
        }
        Ok(outcome)
    }

    fn new_request(&mut self, instance_id: InstanceId, now: SimTime) -> Request {
        let id = RequestId(self.next_request_id);
        self.next_request_id += 1;
        Request::new(id, instance_id, now, self.config.request_duration)
    }

    /// Release a finished request; `false` if it was already released
    pub fn complete_request(&mut self, instance_id: InstanceId, request_id: RequestId) -> bool {
        self.instances
            .get_mut(instance_id.0)
            .is_some_and(|instance| instance.release(request_id))
    }
}
