use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("You need to add {0} to the env")]
    Missing(&'static str),
    #[error("{name} is not a valid number: {value}")]
    NotANumber { name: &'static str, value: String },
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Sessions last between one hour and a year.
pub const SESSION_TTL_HOURS: std::ops::RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `None` keeps everything in memory.
    pub mongodb_uri: Option<String>,
    pub name: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub session_secret: Vec<u8>,
    pub session_ttl_hours: i64,
}

// Keep credentials out of debug logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("session_ttl_hours", &self.session_ttl_hours)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Config {
            server: ServerConfig {
                host: or_default("LOCALSPLIT_HOST", "0.0.0.0"),
                port: parse("LOCALSPLIT_PORT", or_default("LOCALSPLIT_PORT", "8081"))?,
                allowed_origin: or_default("LOCALSPLIT_ALLOWED_ORIGIN", "http://localhost:5173"),
            },
            database: DatabaseConfig {
                mongodb_uri: lookup("MONGODB_URI").filter(|uri| !uri.is_empty()),
                name: or_default("LOCALSPLIT_DATABASE", "LocalSplit"),
            },
            auth: AuthConfig {
                username: required("LOCALSPLIT_USERNAME")?,
                password: required("LOCALSPLIT_PASSWORD")?,
                session_secret: required("LOCALSPLIT_SESSION_SECRET")?.into_bytes(),
                session_ttl_hours: in_range(
                    "LOCALSPLIT_SESSION_TTL_HOURS",
                    parse(
                        "LOCALSPLIT_SESSION_TTL_HOURS",
                        or_default("LOCALSPLIT_SESSION_TTL_HOURS", "24"),
                    )?,
                    SESSION_TTL_HOURS,
                )?,
            },
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::NotANumber { name, value })
}

fn in_range(
    name: &'static str,
    value: i64,
    range: std::ops::RangeInclusive<i64>,
) -> Result<i64, ConfigError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
