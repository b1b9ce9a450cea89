use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("DB_MIN_CONNECTIONS ({min}) must not exceed DB_MAX_CONNECTIONS ({max})")]
    PoolBounds { min: u32, max: u32 },
    #[error("Unsupported database URL {0:?}; expected postgres:// or sqlite:")]
    UnsupportedDatabase(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else {
            Err(ConfigError::UnsupportedDatabase(url.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_connections: 5,
            max_lifetime: Duration::from_secs(5 * 60),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub pool: PoolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost:5432/todo_db".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let pool = PoolConfig {
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", defaults.pool.max_connections)?,
            min_connections: parse_var(&lookup, "DB_MIN_CONNECTIONS", defaults.pool.min_connections)?,
            max_lifetime: Duration::from_secs(parse_var(
                &lookup,
                "DB_MAX_LIFETIME_SECS",
                defaults.pool.max_lifetime.as_secs(),
            )?),
            acquire_timeout: Duration::from_secs(parse_var(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.pool.acquire_timeout.as_secs(),
            )?),
        };
        if pool.min_connections > pool.max_connections {
            return Err(ConfigError::PoolBounds {
                min: pool.min_connections,
                max: pool.max_connections,
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            pool,
        })
    }

    pub fn backend(&self) -> Result<Backend, ConfigError> {
        Backend::from_url(&self.database_url)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}
