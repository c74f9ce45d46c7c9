//! Server configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `LEARNTN_PORT` | `5000` |
//! | `LEARNTN_LOG_LEVEL` | `info` |
//! | `JWT_ACCESS_SECRET` | random per process |
//! | `JWT_REFRESH_SECRET` | random per process |
//! | `JWT_ACCESS_EXPIRES` | `15m` |
//! | `JWT_REFRESH_EXPIRES` | `7d` |
//! | `LEARNTN_LEADERBOARD_LIMIT` | `20` |
//! | `LEARNTN_CATALOG_PATH` | unset |
//! | `LEARNTN_DATABASE_URL` | unset |

use chrono::Duration;
use learntn_auth::TokenConfig;
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::Level;
use uuid::Uuid;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 20;

/// Longest accepted token lifetime, in days
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
}

/// Runtime configuration for the server binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_level: Level,
    pub tokens: TokenConfig,
    pub leaderboard_limit: usize,
    pub catalog_path: Option<PathBuf>,
    pub database_url: Option<String>,
    /// Secrets that were not configured and were generated for this process
    pub generated_secrets: Vec<&'static str>,
}

impl ServerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("LEARNTN_PORT") {
            Some(value) => value.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "LEARNTN_PORT",
                value: value.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let log_level = lookup("LEARNTN_LOG_LEVEL")
            .and_then(|value| value.parse().ok())
            .unwrap_or(Level::INFO);

        let mut generated_secrets = Vec::new();
        let mut secret = |var: &'static str| {
            lookup(var).filter(|s| !s.is_empty()).unwrap_or_else(|| {
                generated_secrets.push(var);
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            })
        };
        let access_secret = secret("JWT_ACCESS_SECRET");
        let refresh_secret = secret("JWT_REFRESH_SECRET");
        if access_secret == refresh_secret {
            return Err(ConfigError::SharedSecret);
        }

        let mut tokens = TokenConfig::new(access_secret, refresh_secret);
        if let Some(value) = lookup("JWT_ACCESS_EXPIRES") {
            tokens = tokens.with_access_ttl(parse_duration("JWT_ACCESS_EXPIRES", &value)?);
        }
        if let Some(value) = lookup("JWT_REFRESH_EXPIRES") {
            tokens = tokens.with_refresh_ttl(parse_duration("JWT_REFRESH_EXPIRES", &value)?);
        }

        let leaderboard_limit = match lookup("LEARNTN_LEADERBOARD_LIMIT") {
            Some(value) => match value.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "LEARNTN_LEADERBOARD_LIMIT",
                        value,
                        reason: "expected a positive integer".into(),
                    })
                }
            },
            None => DEFAULT_LEADERBOARD_LIMIT,
        };

        Ok(Self {
            port,
            log_level,
            tokens,
            leaderboard_limit,
            catalog_path: lookup("LEARNTN_CATALOG_PATH").map(PathBuf::from),
            database_url: lookup("LEARNTN_DATABASE_URL").filter(|s| !s.is_empty()),
            generated_secrets,
        })
    }
}

/// Parse `<n>{s,m,h,d}` (a bare number is seconds), at most [`MAX_TOKEN_TTL_DAYS`]
pub fn parse_duration(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let amount: i64 = digits.parse().map_err(|_| invalid("expected <n>{s,m,h,d}"))?;
    if amount == 0 {
        return Err(invalid("duration must be positive"));
    }

    let duration = match unit {
        "" | "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => return Err(invalid("unknown unit")),
    }
    .ok_or_else(|| invalid("duration out of range"))?;

    if duration > Duration::days(MAX_TOKEN_TTL_DAYS) {
        return Err(invalid("duration exceeds 365d"));
    }
    Ok(duration)
}
