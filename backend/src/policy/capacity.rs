//! Capacity planner
//!
//! Converts a load figure into the number of instances needed to serve it
//! at a target utilization. Always rounds up: under-provisioning drops
//! requests, over-provisioning by a fraction of an instance does not.

use super::ScalingPolicy;

/// Instances required to serve `load` at `target_utilization_pct` percent
///
/// `ceil(load / capacity × 100 / target_utilization_pct)`, evaluated as a
/// single division so that exact integer ratios stay exact. Non-positive or
/// NaN load, and a non-positive capacity or target, yield 0.
///
/// # Example
/// ```
/// use amf_simulator_core::policy::required_instances;
///
/// assert_eq!(required_instances(0.0, 12_000, 80.0), 0);
/// assert_eq!(required_instances(5_000.0, 12_000, 80.0), 1);
/// assert_eq!(required_instances(9_600.0, 12_000, 80.0), 1);
/// assert_eq!(required_instances(9_601.0, 12_000, 80.0), 2);
/// ```
pub fn required_instances(load: f64, capacity: u32, target_utilization_pct: f64) -> usize {
    let positive = |x: f64| x > 0.0 && !x.is_nan();
    if !positive(load) || capacity == 0 || !positive(target_utilization_pct) {
        return 0;
    }
    let needed = (load * 100.0) / (f64::from(capacity) * target_utilization_pct);
    needed.ceil() as usize
}

/// Scale to keep fleet utilization at a fixed target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetUtilizationPolicy {
    capacity: u32,
    target_utilization_pct: f64,
}

impl TargetUtilizationPolicy {
    pub fn new(capacity: u32, target_utilization_pct: f64) -> Self {
        Self {
            capacity,
            target_utilization_pct,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn target_utilization_pct(&self) -> f64 {
        self.target_utilization_pct
    }
}

impl ScalingPolicy for TargetUtilizationPolicy {
    fn required_instances(&self, load: f64) -> usize {
        required_instances(load, self.capacity, self.target_utilization_pct)
    }

    fn name(&self) -> &'static str {
        "target_utilization"
    }
}
