use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Scheduling";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the listen address.
pub const BIND_ADDR_VAR: &str = "SCHEDULING_BIND_ADDR";
/// Environment variable overriding the database file (`:memory:` allowed).
pub const DB_PATH_VAR: &str = "SCHEDULING_DB_PATH";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DATABASE_FILE: &str = "scheduling.db";

/// Fallback `EnvFilter` directives when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "scheduling_lib=info,scheduling=info,warn"
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var} value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("Cannot determine a data directory; set SCHEDULING_DB_PATH")]
    NoDataDir,
}

/// Get the application data directory
/// (platform local data dir, falling back to the home directory).
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join(APP_NAME))
        .ok_or(ConfigError::NoDataDir)
}

/// Get the default database path
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join(DATABASE_FILE))
}

/// Runtime settings for the server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through `lookup`, so tests need not touch the real
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(BIND_ADDR_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: BIND_ADDR_VAR,
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let database_path = match lookup(DB_PATH_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        Ok(Self {
            bind_addr,
            database_path,
        })
    }
}
