//! Server settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use charimachi_directions::session::{DEFAULT_SESSION_CAPACITY, DEFAULT_SESSION_TTL};

/// Runtime configuration for [`run_server`](crate::run_server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`, default `127.0.0.1`).
    pub bind_addr: String,
    /// Port to bind (`PORT`, default `8080`).
    pub port: u16,
    /// Directory holding the prepared JSON datasets
    /// (`CHARIMACHI_DATA_DIR`, default `data`).
    pub data_dir: PathBuf,
    /// Session lifetime (`SESSION_TTL_SECS`, default one hour).
    pub session_ttl: Duration,
    /// Maximum number of live sessions (`SESSION_CAPACITY`).
    pub session_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            session_ttl: DEFAULT_SESSION_TTL,
            session_capacity: DEFAULT_SESSION_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables,
    /// falling back to the defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: lookup("CHARIMACHI_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            session_ttl: lookup("SESSION_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.session_ttl, Duration::from_secs),
            session_capacity: lookup("SESSION_CAPACITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.session_capacity),
        }
    }
}
