use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

use crate::crypto::PBKDF2_ITERATIONS;

/// Application-level constants
pub const APP_NAME: &str = "Wardkeep";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_DATABASE_NAME: &str = "wardkeep";
pub const DEFAULT_PORT: u16 = 5000;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "wardkeep=info,tower_http=warn"
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },

    #[error("Cannot determine a data directory; set DATABASE_DIR")]
    NoDataDir,
}

/// Runtime configuration, read from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub database_dir: PathBuf,
    pub database_name: String,
    /// Cookie signing secret. `None` means a random per-process secret.
    pub secret_key: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub pbkdf2_iterations: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_dir = match get("DATABASE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_database_dir()?,
        };
        let database_name = get("DATABASE_NAME").unwrap_or_else(|| DEFAULT_DATABASE_NAME.into());
        if database_name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                var: "DATABASE_NAME",
                value: database_name,
            });
        }

        let host = match get("IP") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "IP",
                value: raw,
            })?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };
        let pbkdf2_iterations = match get("PBKDF2_ITERATIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    var: "PBKDF2_ITERATIONS",
                    value: raw,
                })?,
            None => PBKDF2_ITERATIONS,
        };

        Ok(Self {
            database_dir,
            database_name,
            secret_key: get("SECRET_KEY"),
            host,
            port,
            pbkdf2_iterations,
        })
    }

    /// Full path of the SQLite file.
    pub fn database_path(&self) -> PathBuf {
        self.database_dir.join(format!("{}.sqlite3", self.database_name))
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_dir", &self.database_dir)
            .field("database_name", &self.database_name)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("pbkdf2_iterations", &self.pbkdf2_iterations)
            .finish()
    }
}

/// `<platform data dir>/wardkeep`
fn default_database_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("wardkeep"))
        .ok_or(ConfigError::NoDataDir)
}
