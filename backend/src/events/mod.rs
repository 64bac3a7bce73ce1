//! Timeline event payloads
//!
//! See `types.rs` for the events a run schedules on its timeline.

pub mod types;

pub use types::SimEvent;
