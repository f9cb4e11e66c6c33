//! Runtime configuration, read from the process environment.
//!
//! `main` loads a `.env` file through `dotenvy` before calling
//! [`Config::from_env`], so every key below may live in either place.
//!
//! | Variable            | Default                        |
//! |---------------------|--------------------------------|
//! | `DATABASE_URL`      | `sqlite://yatube.db?mode=rwc`  |
//! | `BIND_ADDR`         | `0.0.0.0:3000`                 |
//! | `POST_COUNT`        | `10`                           |
//! | `SECRET_KEY`        | development key (warns)        |
//! | `SESSION_TTL_HOURS` | `336`                          |
use std::env;
use std::time::Duration;

use thiserror::Error;

const DEV_SECRET_KEY: &str = "yatube-development-secret-key";

/// Upper bound for `SESSION_TTL_HOURS`: ten years.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be an integer between 1 and {max}, got {value:?}")]
    InvalidNumber {
        name: &'static str,
        max: u64,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Number of posts on one listing page.
    pub post_count: u64,
    /// HMAC key for session tokens.
    pub secret_key: String,
    pub session_ttl_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://yatube.db?mode=rwc".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            post_count: 10,
            secret_key: DEV_SECRET_KEY.to_string(),
            session_ttl_hours: 24 * 14,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let secret_key = match env::var("SECRET_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("SECRET_KEY is not set, using the development key");
                defaults.secret_key
            }
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            post_count: bounded_var("POST_COUNT", defaults.post_count, u32::MAX as u64)?,
            secret_key,
            session_ttl_hours: bounded_var(
                "SESSION_TTL_HOURS",
                defaults.session_ttl_hours as u64,
                MAX_SESSION_TTL_HOURS as u64,
            )? as i64,
        })
    }

    /// Lifetime of a login session. Values outside `1..=MAX_SESSION_TTL_HOURS`
    /// are clamped, so a hand-built `Config` cannot overflow token expiry.
    pub fn session_ttl(&self) -> Duration {
        let hours = self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS) as u64;
        Duration::from_secs(hours * 3600)
    }
}

fn bounded_var(name: &'static str, default: u64, max: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_bounded(name, value, max),
        Err(_) => Ok(default),
    }
}

fn parse_bounded(name: &'static str, value: String, max: u64) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(ConfigError::InvalidNumber { name, max, value }),
    }
}
