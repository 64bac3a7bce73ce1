//! Scaling policy module
//!
//! Decides how many instances the fleet should have for a tick.
//!
//! # Overview
//!
//! Two choices shape a run:
//! - **Which load drives planning** ([`ProvisioningMode`]): the forecast
//!   column, or the real column (oracle / "ideal" provisioning). Admission is
//!   always tested against the real load, so forecast mode exposes the cost
//!   of forecast error.
//! - **How load maps to instances** ([`ScalingPolicy`]): the default
//!   [`TargetUtilizationPolicy`] sizes the fleet so that the planning load
//!   fills it to a target utilization.
//!
//! ```rust
//! use amf_simulator_core::policy::{ProvisioningMode, ScalingPolicy, TargetUtilizationPolicy};
//! use amf_simulator_core::LoadSample;
//!
//! let policy = TargetUtilizationPolicy::new(12_000, 80.0);
//! let sample = LoadSample::new(20_000.0, 5_000);
//!
//! let forecast = policy.required_instances(ProvisioningMode::Forecast.planning_load(&sample));
//! let ideal = policy.required_instances(ProvisioningMode::Ideal.planning_load(&sample));
//! assert_eq!((forecast, ideal), (3, 1));
//! ```

pub mod capacity;

pub use capacity::{required_instances, TargetUtilizationPolicy};

use crate::models::LoadSample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maps a planning load to a required instance count
///
/// Implementations must be pure: the same load always yields the same count.
pub trait ScalingPolicy: Send + Sync {
    /// Number of instances needed for `load`
    fn required_instances(&self, load: f64) -> usize;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

/// Source of the load used for capacity planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProvisioningMode {
    /// Plan from the predicted load
    #[default]
    Forecast,
    /// Plan from the real load (oracle)
    Ideal,
}

impl ProvisioningMode {
    pub fn from_ideal_flag(ideal: bool) -> Self {
        if ideal {
            ProvisioningMode::Ideal
        } else {
            ProvisioningMode::Forecast
        }
    }

    pub fn is_ideal(&self) -> bool {
        matches!(self, ProvisioningMode::Ideal)
    }

    /// Load the capacity planner sees for `sample`
    pub fn planning_load(&self, sample: &LoadSample) -> f64 {
        match self {
            ProvisioningMode::Forecast => sample.predicted,
            ProvisioningMode::Ideal => sample.real as f64,
        }
    }
}

impl fmt::Display for ProvisioningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningMode::Forecast => f.write_str("forecast"),
            ProvisioningMode::Ideal => f.write_str("ideal"),
        }
    }
}
