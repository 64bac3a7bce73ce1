//! Time management for the simulation
//!
//! The simulation samples load in discrete ticks. Tick `i` fires at simulated
//! time `i × period`; a run of `n` ticks ends at the horizon `n × period`.

use serde::{Deserialize, Serialize};

/// Simulated time, in abstract time units
pub type SimTime = u64;

/// Maps tick indices to simulated time
///
/// # Example
/// ```
/// use amf_simulator_core::TickClock;
///
/// let clock = TickClock::new(10); // one tick every 10 time units
/// assert_eq!(clock.tick_time(0), 0);
/// assert_eq!(clock.tick_time(3), 30);
/// assert_eq!(clock.horizon(3), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickClock {
    /// Simulated time between two consecutive ticks
    period: SimTime,
}

impl TickClock {
    /// Create a new TickClock
    ///
    /// # Arguments
    /// * `period` - Simulated time between ticks
    ///
    /// # Panics
    /// Panics if `period` is zero. Configuration validation rejects a zero
    /// period before a clock is ever built.
    pub fn new(period: SimTime) -> Self {
        assert!(period > 0, "tick period must be positive");
        Self { period }
    }

    /// Time at which tick `index` fires
    ///
    /// # Example
    /// ```
    /// use amf_simulator_core::TickClock;
    ///
    /// let clock = TickClock::new(10);
    /// assert_eq!(clock.tick_time(7), 70);
    /// ```
    pub fn tick_time(&self, index: usize) -> SimTime {
        index as SimTime * self.period
    }

    /// End of a run of `num_ticks` ticks
    pub fn horizon(&self, num_ticks: usize) -> SimTime {
        self.tick_time(num_ticks)
    }

    /// Index of the tick in effect at `time` (the last tick fired at or before it)
    ///
    /// # Example
    /// ```
    /// use amf_simulator_core::TickClock;
    ///
    /// let clock = TickClock::new(10);
    /// assert_eq!(clock.tick_at(0), 0);
    /// assert_eq!(clock.tick_at(19), 1);
    /// assert_eq!(clock.tick_at(20), 2);
    /// ```
    pub fn tick_at(&self, time: SimTime) -> usize {
        (time / self.period) as usize
    }

    /// Get the tick period
    pub fn period(&self) -> SimTime {
        self.period
    }
}
