//! Run report
//!
//! Everything a finished run produced. The report is returned by value, so
//! each run's results stay with its caller.

use crate::metrics::RunMetrics;
use crate::models::event::EventLog;
use crate::orchestrator::engine::SimulationConfig;
use crate::orchestrator::snapshot::StateLog;
use crate::policy::ProvisioningMode;
use serde::{Deserialize, Serialize};

/// Results of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: ProvisioningMode,

    /// Configuration the run used
    pub config: SimulationConfig,

    /// SHA-256 of the canonical JSON config
    pub config_hash: String,

    /// SHA-256 of the tick records
    pub digest: String,

    /// One record per tick
    pub metrics: RunMetrics,

    /// One fleet snapshot per tick
    pub state_log: StateLog,

    /// Lifecycle events in order of occurrence
    pub events: EventLog,

    /// Size of the fleet at the end of the run (instances are never removed)
    pub instances_created: usize,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            mode: self.mode,
            ticks: self.metrics.len(),
            total_requests: self.metrics.total_requests(),
            total_unallocated: self.metrics.total_unallocated(),
            overall_loss_pct: self.metrics.overall_loss_pct(),
            mean_utilization_pct: self.metrics.mean_utilization_pct(),
            peak_active_instances: self.metrics.peak_active_instances(),
            peak_on_instances: self.metrics.peak_on_instances(),
            instances_created: self.instances_created,
            config_hash: self.config_hash.clone(),
            digest: self.digest.clone(),
        }
    }
}

/// Headline numbers of a run, suitable for JSON output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: ProvisioningMode,
    pub ticks: usize,
    pub total_requests: u64,
    pub total_unallocated: u64,
    pub overall_loss_pct: f64,
    pub mean_utilization_pct: f64,
    pub peak_active_instances: usize,
    pub peak_on_instances: usize,
    pub instances_created: usize,
    pub config_hash: String,
    pub digest: String,
}
