//! Liveness checking for pooled connections
//!
//! This module provides the probe run against a pool, the timer that
//! schedules it, and the configuration for both.
//!
//! # Example
//!
//! ```ignore
//! use sqlrelay_connection::health::{LivenessConfig, ping_pool};
//!
//! let config = LivenessConfig::default();
//! let latency = ping_pool(pool.as_ref(), config.statement()).await?;
//! println!("Database latency: {:?}", latency);
//! ```

mod checker;
mod ping;
mod timer;


pub use checker::{LivenessConfig, ProbeReport};
pub use ping::{PingError, PingResult, ping_pool};
pub use timer::LivenessTimer;
