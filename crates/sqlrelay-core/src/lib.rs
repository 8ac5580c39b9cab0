//! sqlrelay core - shared types and traits
//!
//! This crate provides the pieces every other sqlrelay crate depends on:
//!
//! - `Pool` / `PoolFactory` - the opaque pooled-connection capability
//! - `ConnectionState` and `StateBroadcaster` - liveness state fan-out
//! - `format_named` - `:name` placeholder substitution
//! - `Value`, `Row`, `QueryResult` - data passed through the adapter
//! - `ServerConfig`, `PoolConfig` - configuration

mod config;
mod error;
mod events;
mod params;
mod pool;
mod state;
mod types;

pub use config::*;
pub use error::*;
pub use events::*;
pub use params::*;
pub use pool::*;
pub use state::*;
pub use types::*;
