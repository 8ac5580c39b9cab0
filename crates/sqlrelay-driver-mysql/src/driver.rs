//! MySQL driver implementation

use std::sync::Arc;

use mysql_async::{Opts, OptsBuilder, PoolConstraints, PoolOpts};
use sqlrelay_core::{Pool, PoolConfig, PoolFactory, Result, ServerConfig, SqlRelayError};

use crate::MySqlPool;
use crate::tls::{ssl_mode_label, ssl_opts_for};

/// MySQL database driver
///
/// Builds lazily-connecting `mysql_async` pools. Creating a pool performs no
/// network I/O, but `mysql_async` spawns its recycler task on creation, so
/// `create` must be called from within a Tokio runtime.
pub struct MySqlDriver;

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self
    }

    pub fn name(&self) -> &'static str {
        "mysql"
    }

    pub fn default_port(&self) -> u16 {
        3306
    }

    /// Translate sqlrelay configuration into `mysql_async` options
    pub fn build_opts(&self, server: &ServerConfig, config: &PoolConfig) -> Result<Opts> {
        server.validate()?;

        let max = config.max_connections();
        let constraints = PoolConstraints::new(0, max).ok_or_else(|| {
            SqlRelayError::Configuration(format!(
                "Failed to configure MySQL pool constraints (min=0, max={})",
                max
            ))
        })?;
        let pool_opts = PoolOpts::default().with_constraints(constraints);

        let port = if server.port > 0 {
            server.port
        } else {
            self.default_port()
        };

        let mut opts_builder = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(server.host.as_str())
            .tcp_port(port)
            .ssl_opts(ssl_opts_for(server))
            .pool_opts(pool_opts);

        if let Some(db) = &server.database {
            opts_builder = opts_builder.db_name(Some(db.as_str()));
        }
        if let Some(u) = &server.user {
            opts_builder = opts_builder.user(Some(u.as_str()));
        }
        if let Some(p) = &server.password {
            opts_builder = opts_builder.pass(Some(p.as_str()));
        }

        Ok(opts_builder.into())
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolFactory for MySqlDriver {
    #[tracing::instrument(skip(self, server, config), fields(server = %server.target()))]
    fn create(&self, server: &ServerConfig, config: &PoolConfig) -> Result<Arc<dyn Pool>> {
        let opts = self.build_opts(server, config)?;
        let pool = mysql_async::Pool::new(opts);

        tracing::info!(
            max_connections = config.max_connections(),
            ssl_mode = ssl_mode_label(server),
            "MySQL pool created"
        );
        Ok(Arc::new(MySqlPool::new(pool, config.clone())))
    }
}
