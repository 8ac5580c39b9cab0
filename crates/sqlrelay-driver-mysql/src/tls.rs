//! MySQL TLS Support
//!
//! The server configuration only carries an on/off flag. When on, the
//! connection uses TLS with the platform roots and full certificate and
//! hostname verification.

use mysql_async::SslOpts;
use sqlrelay_core::ServerConfig;
use tracing::debug;

/// Build SSL options for `config`, `None` when TLS is off
pub fn ssl_opts_for(config: &ServerConfig) -> Option<SslOpts> {
    if !config.tls {
        debug!("TLS disabled, returning None for SSL options");
        return None;
    }

    debug!(host = %config.host, "building MySQL SSL options with full verification");
    Some(SslOpts::default())
}

/// The MySQL `ssl-mode` equivalent of the configuration, for logging
pub fn ssl_mode_label(config: &ServerConfig) -> &'static str {
    if config.tls { "VERIFY_IDENTITY" } else { "DISABLED" }
}
