//! Client side of the harness. The Probe times every body
//! read, the Reporter turns the recorded arrivals into console output.

pub mod probe;
pub mod report;

pub use probe::{Probe, ProbeError};
