//! Per-lease circuit-breaker state machine (C2): Closed/Open/HalfOpen with
//! generation-fenced counters.

#![deny(missing_docs)]

mod circuit;
mod registry;

pub use circuit::{Circuit, CircuitConfig, CircuitOpen, Generation, State};
pub use registry::CircuitRegistry;
