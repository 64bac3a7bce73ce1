//! Simulated time: tick clock and event timeline

pub mod time;
pub mod timeline;
