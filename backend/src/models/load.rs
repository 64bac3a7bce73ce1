//! Per-tick load sample

use serde::{Deserialize, Serialize};

/// Load observed for one tick
///
/// `predicted` comes from a forecast and may be fractional; `real` is the
/// number of requests that actually arrive and must be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSample {
    pub predicted: f64,
    pub real: u64,
}

impl LoadSample {
    pub fn new(predicted: f64, real: u64) -> Self {
        Self { predicted, real }
    }
}
