//! Orchestrator Engine
//!
//! Runs one dataset through the fleet model:
//! - Seeding (instances needed for the first row, ON at time 0)
//! - One tick event per dataset row at `row × period`
//! - Fleet management per tick (aging, reconciliation, allocation)
//! - Request completions and delayed activations as timeline events
//! - Metrics and state log (one record and one snapshot per tick)
//!
//! # Architecture
//!
//! ```text
//! Orchestrator::new
//!   validate config → seed fleet → schedule Tick{0..n}
//! Orchestrator::run
//!   while next event fires before the horizon:
//!     Tick{i}            → plan, age, reconcile, allocate, record
//!     Activate{id}       → instance ON
//!     CompleteRequest{…} → release slot
//!   clock := horizon
//! ```
//!
//! All tick events are scheduled before anything else, so at equal times a
//! tick is dispatched ahead of completions and activations scheduled later.
//!
//! # Example
//!
//! ```rust
//! use amf_simulator_core::orchestrator::{Orchestrator, SimulationConfig};
//! use amf_simulator_core::policy::ProvisioningMode;
//! use amf_simulator_core::LoadSample;
//!
//! let samples = vec![LoadSample::new(5_000.0, 5_000); 3];
//! let orchestrator = Orchestrator::new(
//!     SimulationConfig::default(),
//!     ProvisioningMode::Forecast,
//!     samples,
//! )
//! .unwrap();
//!
//! let report = orchestrator.run().unwrap();
//! assert_eq!(report.metrics.len(), 3);
//! assert_eq!(report.metrics.total_unallocated(), 0);
//! ```

use crate::core::time::{SimTime, TickClock};
use crate::core::timeline::{ScheduleError, Timeline};
use crate::events::SimEvent;
use crate::fleet::{FleetConfig, InstanceManager};
use crate::io::dataset::InputError;
use crate::metrics::{percentage, RunMetrics, TickRecord};
use crate::models::instance::DrainSchedule;
use crate::models::LoadSample;
use crate::orchestrator::report::RunReport;
use crate::orchestrator::snapshot::{
    compute_config_hash, compute_run_digest, FleetSnapshot, StateLog,
};
use crate::policy::{ProvisioningMode, ScalingPolicy, TargetUtilizationPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete simulation configuration
///
/// Any subset of fields may be given in JSON; the rest take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Maximum concurrent requests per instance (20 req/s over 600 s)
    pub instance_capacity: u32,

    /// Utilization the capacity planner provisions for, in percent
    pub target_utilization_pct: f64,

    /// Simulated time between ticks
    pub tick_period: SimTime,

    /// Execution time of a request
    ///
    /// One unit shorter than the tick period by default, so a tick's requests
    /// have drained by the time the next tick fires.
    pub request_duration: SimTime,

    /// Delay between creating an instance and turning it ON
    pub activation_delay: SimTime,

    /// Life budget of non-seed instances
    pub initial_life: f64,

    /// Life lost per tick while ON
    pub damage: f64,

    /// Length of each shutdown phase
    pub drain_duration: SimTime,

    /// Admission limit in drain phase 1, percent of capacity
    pub phase1_admission_pct: u32,

    /// Admission limit in drain phase 2, percent of capacity
    pub phase2_admission_pct: u32,

    /// Upper bound on the instance count the planner may ask for
    pub max_instances: usize,

    /// Keep a snapshot of every instance after each tick
    ///
    /// Memory grows as ticks × fleet size.
    pub record_state_log: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            instance_capacity: 20 * 600,
            target_utilization_pct: 80.0,
            tick_period: 10,
            request_duration: 9,
            activation_delay: 0,
            initial_life: 2.0,
            damage: 1.0,
            drain_duration: 10,
            phase1_admission_pct: 5,
            phase2_admission_pct: 1,
            max_instances: 10_000,
            record_state_log: true,
        }
    }
}

impl SimulationConfig {
    /// Check every field a run depends on
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.instance_capacity == 0 {
            return Err(SimulationError::InvalidConfig(
                "instance_capacity must be > 0".to_string(),
            ));
        }

        if self.max_instances == 0 {
            return Err(SimulationError::InvalidConfig(
                "max_instances must be > 0".to_string(),
            ));
        }

        if self.tick_period == 0 {
            return Err(SimulationError::InvalidConfig(
                "tick_period must be > 0".to_string(),
            ));
        }

        if !(self.target_utilization_pct.is_finite() && self.target_utilization_pct > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "target_utilization_pct must be a positive number, got {}",
                self.target_utilization_pct
            )));
        }

        if !self.initial_life.is_finite() || !self.damage.is_finite() || self.damage < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "initial_life and damage must be finite, damage non-negative".to_string(),
            ));
        }

        for (name, pct) in [
            ("phase1_admission_pct", self.phase1_admission_pct),
            ("phase2_admission_pct", self.phase2_admission_pct),
        ] {
            if pct > 100 {
                return Err(SimulationError::InvalidConfig(format!(
                    "{} must be <= 100, got {}",
                    name, pct
                )));
            }
        }

        Ok(())
    }

    /// Fleet-level view of this configuration
    pub fn fleet_config(&self) -> FleetConfig {
        FleetConfig {
            instance_capacity: self.instance_capacity,
            initial_life: self.initial_life,
            damage: self.damage,
            activation_delay: self.activation_delay,
            request_duration: self.request_duration,
            drain: DrainSchedule {
                drain_duration: self.drain_duration,
                phase1_admission_pct: self.phase1_admission_pct,
                phase2_admission_pct: self.phase2_admission_pct,
            },
        }
    }
}

/// Simulation error types
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation error
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Dataset could not be used
    #[error(transparent)]
    Input(#[from] InputError),

    /// Event scheduled in the past
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Config or results could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Single-run simulation driver
///
/// Owns every piece of run state: timeline, fleet, metrics and state log.
/// Nothing is shared between orchestrators, so runs can execute in parallel.
pub struct Orchestrator {
    config: SimulationConfig,
    mode: ProvisioningMode,
    clock: TickClock,
    policy: Box<dyn ScalingPolicy>,
    samples: Vec<LoadSample>,
    timeline: Timeline<SimEvent>,
    manager: InstanceManager,
    metrics: RunMetrics,
    state_log: StateLog,
}

impl Orchestrator {
    /// Create an orchestrator with the target-utilization scaling policy
    ///
    /// # Errors
    /// * `SimulationError::InvalidConfig` - configuration rejected; nothing scheduled
    /// * `SimulationError::Input` - `samples` is empty
    pub fn new(
        config: SimulationConfig,
        mode: ProvisioningMode,
        samples: Vec<LoadSample>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let policy = TargetUtilizationPolicy::new(
            config.instance_capacity,
            config.target_utilization_pct,
        );
        Self::with_policy(config, mode, samples, Box::new(policy))
    }

    /// Create an orchestrator with a custom scaling policy
    pub fn with_policy(
        config: SimulationConfig,
        mode: ProvisioningMode,
        samples: Vec<LoadSample>,
        policy: Box<dyn ScalingPolicy>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let first = samples.first().ok_or(InputError::EmptyDataset)?;

        let clock = TickClock::new(config.tick_period);
        let mut manager = InstanceManager::new(config.fleet_config());
        let seeds = capped_requirement(
            &*policy,
            mode.planning_load(first),
            config.max_instances,
            0,
        );
        manager.seed(seeds, 0);

        let mut timeline = Timeline::new();
        for index in 0..samples.len() {
            timeline.schedule(SimEvent::Tick { index }, clock.tick_time(index))?;
        }

        Ok(Self {
            config,
            mode,
            clock,
            policy,
            samples,
            timeline,
            manager,
            metrics: RunMetrics::new(),
            state_log: StateLog::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_time(&self) -> SimTime {
        self.timeline.now()
    }

    /// End of the run
    pub fn horizon(&self) -> SimTime {
        self.clock.horizon(self.samples.len())
    }

    pub fn mode(&self) -> ProvisioningMode {
        self.mode
    }

    pub fn manager(&self) -> &InstanceManager {
        &self.manager
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn state_log(&self) -> &StateLog {
        &self.state_log
    }

    // ========================================================================
    // Event Loop
    // ========================================================================

    /// Dispatch every event before `until` (capped at the horizon)
    pub fn run_until(&mut self, until: SimTime) -> Result<(), SimulationError> {
        let until = until.min(self.horizon());
        while let Some((time, event)) = self.timeline.next_before(until) {
            self.dispatch(time, event)?;
        }
        self.timeline.advance_to(until);
        Ok(())
    }

    /// Run to the horizon and produce the report
    pub fn run(mut self) -> Result<RunReport, SimulationError> {
        info!(
            ticks = self.samples.len(),
            mode = %self.mode,
            policy = self.policy.name(),
            seeded = self.manager.instances().len(),
            "simulation started"
        );

        self.run_until(self.horizon())?;

        let config_hash = compute_config_hash(&self.config)?;
        let digest = compute_run_digest(self.metrics.records())?;
        let instances_created = self.manager.instances().len();

        info!(
            total_requests = self.metrics.total_requests(),
            unallocated = self.metrics.total_unallocated(),
            loss_pct = self.metrics.overall_loss_pct(),
            instances_created,
            "simulation finished"
        );

        Ok(RunReport {
            mode: self.mode,
            config: self.config,
            config_hash,
            digest,
            metrics: self.metrics,
            state_log: self.state_log,
            events: self.manager.into_events(),
            instances_created,
        })
    }

    fn dispatch(&mut self, time: SimTime, event: SimEvent) -> Result<(), SimulationError> {
        match event {
            SimEvent::Tick { index } => self.on_tick(index, time)?,
            SimEvent::Activate { instance_id } => self.manager.activate(instance_id, time),
            SimEvent::CompleteRequest {
                instance_id,
                request_id,
            } => {
                self.manager.complete_request(instance_id, request_id);
            }
        }
        Ok(())
    }

    fn on_tick(&mut self, index: usize, now: SimTime) -> Result<(), SimulationError> {
        let Some(sample) = self.samples.get(index).copied() else {
            return Ok(());
        };
        let planning_load = self.mode.planning_load(&sample);
        let required = capped_requirement(
            &*self.policy,
            planning_load,
            self.config.max_instances,
            now,
        );

        let outcome = self
            .manager
            .process_tick(required, sample.real, now, &mut self.timeline)?;

        let record = TickRecord {
            tick: index,
            time: now,
            total_load: sample.real,
            planning_load,
            required_instances: required,
            admitted: outcome.allocation.admitted,
            unallocated: outcome.allocation.unallocated,
            loss_pct: percentage(
                outcome.allocation.unallocated as f64,
                sample.real as f64,
            ),
            utilization_pct: self.manager.utilization_pct(),
            active_instances: self.manager.active_count(),
            on_instances: self.manager.on_count(),
        };

        debug!(
            tick = index,
            time = now,
            required,
            created = outcome.reconcile.created,
            admitted = record.admitted,
            unallocated = record.unallocated,
            "tick processed"
        );

        if self.config.record_state_log {
            self.state_log
                .append(FleetSnapshot::capture(&record, self.manager.instances()));
        }
        self.metrics.record(record);
        Ok(())
    }
}

/// Planner output bounded by `max_instances`
fn capped_requirement(
    policy: &dyn ScalingPolicy,
    load: f64,
    max_instances: usize,
    now: SimTime,
) -> usize {
    let required = policy.required_instances(load);
    if required > max_instances {
        warn!(
            time = now,
            load,
            required,
            max_instances,
            "planner exceeded the instance ceiling, capping"
        );
    }
    required.min(max_instances)
}

/// Validate, build and run in one call
pub fn run_simulation(
    config: SimulationConfig,
    mode: ProvisioningMode,
    samples: Vec<LoadSample>,
) -> Result<RunReport, SimulationError> {
    Orchestrator::new(config, mode, samples)?.run()
}
