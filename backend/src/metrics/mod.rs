//! Run-scoped metrics
//!
//! Every run owns its own [`RunMetrics`]: one immutable [`TickRecord`] per
//! tick, plus aggregates derived from them. Nothing here is global, so
//! parallel or repeated runs in one process never share accumulators.
//!
//! All ratios go through [`percentage`], which defines `x / 0` as 0.

use crate::core::time::SimTime;
use serde::{Deserialize, Serialize};

/// `numerator / denominator × 100`, or 0 when the denominator is 0
///
/// # Example
/// ```
/// use amf_simulator_core::metrics::percentage;
///
/// assert_eq!(percentage(1.0, 4.0), 25.0);
/// assert_eq!(percentage(3.0, 0.0), 0.0);
/// ```
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Tick index (dataset row)
    pub tick: usize,

    /// Simulated time the tick fired at
    pub time: SimTime,

    /// Real requests that arrived this tick
    pub total_load: u64,

    /// Load the capacity planner was given
    pub planning_load: f64,

    /// Instances the planner asked for
    pub required_instances: usize,

    /// Requests admitted by some instance
    pub admitted: u64,

    /// Requests dropped for lack of headroom
    pub unallocated: u64,

    /// `unallocated / total_load × 100`
    pub loss_pct: f64,

    /// `Σ active / Σ admission limit × 100` over serving instances
    pub utilization_pct: f64,

    /// Instances ON or SHUTTING_DOWN
    pub active_instances: usize,

    /// Instances strictly ON
    pub on_instances: usize,
}

/// Per-run accumulator of tick records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    records: Vec<TickRecord>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the record of the tick that just finished
    pub fn record(&mut self, record: TickRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Real requests over the whole run
    pub fn total_requests(&self) -> u64 {
        self.records.iter().map(|r| r.total_load).sum()
    }

    /// Dropped requests over the whole run
    pub fn total_unallocated(&self) -> u64 {
        self.records.iter().map(|r| r.unallocated).sum()
    }

    /// Dropped share of all real requests
    pub fn overall_loss_pct(&self) -> f64 {
        percentage(
            self.total_unallocated() as f64,
            self.total_requests() as f64,
        )
    }

    /// Mean of the per-tick utilization (0 for an empty run)
    pub fn mean_utilization_pct(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.records.iter().map(|r| r.utilization_pct).sum();
        sum / self.records.len() as f64
    }

    pub fn peak_active_instances(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.active_instances)
            .max()
            .unwrap_or(0)
    }

    pub fn peak_on_instances(&self) -> usize {
        self.records.iter().map(|r| r.on_instances).max().unwrap_or(0)
    }
}
