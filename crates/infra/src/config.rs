//! Configuration loading from the process environment.
//!
//! Every key has a default; a value that is present but unparseable is an error
//! rather than a silent fallback.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;
use tracing::warn;

use clientreg_clients::ValidationMode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Postgres connection settings plus the connect retry policy.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub connect_retries: u32,
    pub retry_delay: Duration,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        let opts = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.name);
        if self.password.is_empty() {
            opts
        } else {
            opts.password(&self.password)
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("connect_retries", &self.connect_retries)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// `false` runs entirely on in-memory stores (dev/test).
    pub use_persistent_stores: bool,
    pub document_validation: ValidationMode,
    pub metrics_queue_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let password = get("DB_PASSWORD", "");
        if password.is_empty() {
            warn!("DB_PASSWORD not set; connecting without a password");
        }

        let database = DatabaseConfig {
            host: get("DB_HOST", "localhost"),
            port: parse("DB_PORT", get("DB_PORT", "5432"))?,
            user: get("DB_USER", "postgres"),
            password,
            name: get("DB_NAME", "clients"),
            connect_retries: parse("DB_CONNECT_RETRIES", get("DB_CONNECT_RETRIES", "5"))?,
            retry_delay: Duration::from_secs(parse(
                "DB_CONNECT_RETRY_DELAY_SECS",
                get("DB_CONNECT_RETRY_DELAY_SECS", "5"),
            )?),
        };

        let server = ServerConfig {
            bind_addr: parse("BIND_ADDR", get("BIND_ADDR", "0.0.0.0:8080"))?,
        };

        let metrics_queue_capacity: usize =
            parse("METRICS_QUEUE_CAPACITY", get("METRICS_QUEUE_CAPACITY", "1024"))?;
        if metrics_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "METRICS_QUEUE_CAPACITY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            database,
            server,
            use_persistent_stores: parse(
                "USE_PERSISTENT_STORES",
                get("USE_PERSISTENT_STORES", "false").to_ascii_lowercase(),
            )?,
            document_validation: parse(
                "DOCUMENT_VALIDATION",
                get("DOCUMENT_VALIDATION", "structural"),
            )?,
            metrics_queue_capacity,
        })
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}
