//! Event timeline
//!
//! Single-clock discrete-event queue. Events are dispatched in order of
//! `(fire_time, sequence)`, where the sequence number is assigned at
//! scheduling time, so events sharing a fire time come out FIFO.
//!
//! A handler "suspends" by scheduling a future event and returning; the
//! owner of the timeline resumes it when that event is popped. Nothing is
//! ever dispatched at or beyond the run horizon, which is how in-flight work
//! past the end of a run is dropped.
//!
//! # Example
//!
//! ```rust
//! use amf_simulator_core::Timeline;
//!
//! let mut timeline = Timeline::new();
//! timeline.schedule("late", 20).unwrap();
//! timeline.schedule("early", 10).unwrap();
//! timeline.schedule("tie", 10).unwrap();
//!
//! let mut fired = Vec::new();
//! timeline.run(30, |_, time, event| fired.push((time, event)));
//!
//! assert_eq!(fired, vec![(10, "early"), (10, "tie"), (20, "late")]);
//! assert_eq!(timeline.now(), 30);
//! ```

use crate::core::time::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use thiserror::Error;
use tracing::trace;

/// Errors raised by the timeline
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Cannot schedule event at {at}: current time is {now}")]
    InPast { at: SimTime, now: SimTime },
}

/// Heap entry: an event plus its ordering key
#[derive(Debug)]
struct Scheduled<E> {
    time: SimTime,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior in BinaryHeap
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Deterministic event queue with a monotonic clock
#[derive(Debug)]
pub struct Timeline<E> {
    now: SimTime,
    next_seq: u64,
    queue: BinaryHeap<Scheduled<E>>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timeline<E> {
    /// Create an empty timeline at time 0
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events waiting to be dispatched
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Fire time of the next event, if any
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|entry| entry.time)
    }

    /// Register `event` to fire at `at`
    ///
    /// Returns the sequence number assigned to the event.
    ///
    /// # Errors
    /// `ScheduleError::InPast` if `at` is earlier than the current time.
    pub fn schedule(&mut self, event: E, at: SimTime) -> Result<u64, ScheduleError> {
        if at < self.now {
            return Err(ScheduleError::InPast { at, now: self.now });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled {
            time: at,
            seq,
            event,
        });
        Ok(seq)
    }

    /// Register `event` to fire `delay` time units from now
    pub fn schedule_in(&mut self, event: E, delay: SimTime) -> Result<u64, ScheduleError> {
        self.schedule(event, self.now.saturating_add(delay))
    }

    /// Pop the next event firing strictly before `until`, advancing the clock to it
    ///
    /// Returns `None` (leaving the clock untouched) when no such event exists.
    pub fn next_before(&mut self, until: SimTime) -> Option<(SimTime, E)> {
        if self.peek_time()? >= until {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now = entry.time;
        trace!(time = entry.time, seq = entry.seq, "dispatch");
        Some((entry.time, entry.event))
    }

    /// Move the clock forward to `until` without dispatching anything
    ///
    /// Never moves the clock backwards.
    pub fn advance_to(&mut self, until: SimTime) {
        self.now = self.now.max(until);
    }

    /// Dispatch every event firing before `until`, then set the clock to `until`
    ///
    /// The handler receives the timeline itself so it can schedule follow-up
    /// events; those are dispatched in the same run if they fall before `until`.
    pub fn run<F>(&mut self, until: SimTime, mut handler: F)
    where
        F: FnMut(&mut Self, SimTime, E),
    {
        while let Some((time, event)) = self.next_before(until) {
            handler(self, time, event);
        }
        self.advance_to(until);
    }
}
