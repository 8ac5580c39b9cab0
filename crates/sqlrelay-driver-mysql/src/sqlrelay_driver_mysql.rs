//! MySQL/MariaDB pool backend

mod driver;
mod escape;
mod pool;
mod tls;

pub use driver::MySqlDriver;
pub use escape::{escape_identifier, escape_literal};
pub use pool::MySqlPool;
pub use tls::{ssl_mode_label, ssl_opts_for};
