//! Runtime settings read from the process environment.
//!
//! `main` loads a `.env` file with `dotenv` first, so every variable below can
//! also live there.

use std::env;
use std::str::FromStr;

use derive_more::{Display, Error};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DB_PATH: &str = "app.db";
pub const DEFAULT_POOL_SIZE: u32 = 8;

#[derive(Debug, Display, Error)]
#[display("invalid value {value:?} for {key}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub pool_size: u32,
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_path: DEFAULT_DB_PATH.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("TASKTRACK_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "TASKTRACK_PORT", defaults.port)?,
            database_path: lookup("TASKTRACK_DB_PATH").unwrap_or(defaults.database_path),
            pool_size: parse_or(&lookup, "TASKTRACK_POOL_SIZE", defaults.pool_size)?,
            bcrypt_cost: parse_or(&lookup, "TASKTRACK_BCRYPT_COST", defaults.bcrypt_cost)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError {
            key: key.to_string(),
            value: raw,
        }),
    }
}
