//! sqlrelay connection - shared pool lifecycle and liveness
//!
//! This crate owns the pool behind every relay: it creates it on demand,
//! probes it on a timer, and broadcasts connection state.

pub mod health;
mod manager;

#[cfg(test)]
mod testing;

pub use health::{LivenessConfig, LivenessTimer, PingError, PingResult, ProbeReport, ping_pool};
pub use manager::ConnectionManager;
