//! Server configuration
//!
//! Reads the process environment (after loading `.env` when present):
//!   PORT / BIND_ADDR: listen address (default: 0.0.0.0:10000)
//!   DATABASE_URL: Postgres connection string
//!   DATABASE_POOL_SIZE: pool size (default: 10)
//!   JWT_SECRET: HMAC secret for bearer tokens
//!   JWT_TTL_HOURS: token lifetime (default: 12)
//!   SLACK_CLIENT_ID, SLACK_CLIENT_SECRET, SLACK_REDIRECT_URI, SLACK_API_BASE
//!   CORS_ALLOW_ORIGIN: single allowed origin (default: any)

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: String },

    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Slack OpenID Connect application credentials
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub database_pool_size: u32,
    pub jwt_secret: Option<String>,
    pub jwt_ttl_hours: i64,
    /// `None` when either Slack credential is missing; sign-in is disabled.
    pub slack: Option<SlackConfig>,
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match var("BIND_ADDR") {
            Some(addr) => addr,
            None => {
                let port: u16 = parse_or(&var, "PORT", DEFAULT_PORT)?;
                format!("0.0.0.0:{port}")
            }
        };

        let slack = match (var("SLACK_CLIENT_ID"), var("SLACK_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SlackConfig {
                client_id,
                client_secret,
                redirect_uri: var("SLACK_REDIRECT_URI"),
                api_base: var("SLACK_API_BASE")
                    .unwrap_or_else(|| DEFAULT_SLACK_API_BASE.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            }),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one of SLACK_CLIENT_ID / SLACK_CLIENT_SECRET is set; Slack sign-in disabled");
                None
            }
        };

        let jwt_ttl_hours: i64 = parse_or(&var, "JWT_TTL_HOURS", 12)?;
        if jwt_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_HOURS".into(),
                value: jwt_ttl_hours.to_string(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL"),
            database_pool_size: parse_or(&var, "DATABASE_POOL_SIZE", 10)?,
            jwt_secret: var("JWT_SECRET"),
            jwt_ttl_hours,
            slack,
            cors_allow_origin: var("CORS_ALLOW_ORIGIN"),
        })
    }

    pub fn require_jwt_secret(&self) -> Result<&str, ConfigError> {
        self.jwt_secret.as_deref().ok_or_else(|| ConfigError::Missing {
            key: "JWT_SECRET".into(),
        })
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::Missing {
                key: "DATABASE_URL".into(),
            })
    }
}

fn parse_or<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
            value,
        }),
    }
}
