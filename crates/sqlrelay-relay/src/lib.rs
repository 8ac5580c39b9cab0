//! sqlrelay relay layer
//!
//! Turns incoming messages into queries against a shared
//! [`ConnectionManager`](sqlrelay_connection::ConnectionManager) and reports
//! results, errors and connection status back to the hosting runtime.
//!
//! # Architecture
//!
//! ```text
//! Host runtime (messages in, messages/status/errors out)
//!     ↓
//! QueryRelay ← This crate
//!     ↓
//! ConnectionManager (sqlrelay-connection)
//!     ↓
//! Pool (sqlrelay-driver-mysql)
//! ```

mod host;
mod message;
mod relay;
mod status;

pub use host::RelayHost;
pub use message::{Message, QueryRequest};
pub use relay::QueryRelay;
pub use status::{NodeStatus, StatusFill, StatusShape};
