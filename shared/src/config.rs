//! Configuration management for the calendar server.

use sqlx::postgres::PgConnectOptions;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::db::RetryPolicy;
use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database user
    pub db_user: String,
    /// Database password
    pub db_password: String,
    /// Database host
    pub db_host: String,
    /// Database port
    pub db_port: u16,
    /// Database name
    pub db_name: String,
    /// Upper bound on pooled connections
    pub db_max_connections: u32,
    /// Public base URL that share links are built on
    pub public_origin: String,
    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,
    /// Listen address of the HTTP server
    pub bind_addr: SocketAddr,
    /// Readiness check attempts before giving up
    pub startup_attempts: u32,
    /// Fixed delay between readiness checks
    pub startup_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_user: "calendar".to_string(),
            db_password: "calendar".to_string(),
            db_host: "db".to_string(),
            db_port: 5432,
            db_name: "calendar".to_string(),
            db_max_connections: 10,
            public_origin: "http://localhost".to_string(),
            cors_origin: "*".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            startup_attempts: 30,
            startup_delay: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let public_origin = lookup("PUBLIC_ORIGIN").unwrap_or(defaults.public_origin);

        Ok(Self {
            db_user: lookup("POSTGRES_USER").unwrap_or(defaults.db_user),
            db_password: lookup("POSTGRES_PASSWORD").unwrap_or(defaults.db_password),
            db_host: lookup("POSTGRES_HOST").unwrap_or(defaults.db_host),
            db_port: parse_var(&lookup, "POSTGRES_PORT", defaults.db_port)?,
            db_name: lookup("POSTGRES_DB").unwrap_or(defaults.db_name),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            public_origin: public_origin.trim_end_matches('/').to_string(),
            cors_origin: lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            bind_addr: parse_var(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            startup_attempts: parse_var(&lookup, "STARTUP_ATTEMPTS", defaults.startup_attempts)?,
            startup_delay: Duration::from_millis(parse_var(
                &lookup,
                "STARTUP_DELAY_MS",
                defaults.startup_delay.as_millis() as u64,
            )?),
        })
    }

    /// Connection options for the PostgreSQL pool.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
    }

    /// Share link for a calendar token.
    pub fn share_url(&self, token: &str) -> String {
        format!("{}/c/{}", self.public_origin, token)
    }

    /// Whether any origin may call the API.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origin.trim() == "*"
    }

    pub fn startup_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.startup_attempts.max(1),
            delay: self.startup_delay,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} is invalid ({:?}): {}", key, raw, e))),
        None => Ok(default),
    }
}
