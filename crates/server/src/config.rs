//! Server configuration, read from the environment once at startup
use core::net::SocketAddr;
use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://bookshelf.db";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_BCRYPT_COST: u32 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: SocketAddr,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
}

impl core::fmt::Debug for Config {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        formatter
            .debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("cookie_secure", &self.cookie_secure)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            message: format!("expected true or false, got `{other}`"),
        }),
    }
}

impl Config {
    /// Reads the configuration from the process environment
    /// # Errors
    /// Fails if `JWT_SECRET` is unset or empty, or if any variable cannot be parsed.
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a variable if set
    /// # Errors
    /// Same as [`Config::from_env`].
    #[allow(clippy::missing_inline_in_public_items, reason = "Called once at startup")]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned())
            .parse()
            .map_err(|error: core::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDRESS",
                message: error.to_string(),
            })?;

        let cookie_secure = lookup("COOKIE_SECURE")
            .map(|value| parse_flag("COOKIE_SECURE", &value))
            .transpose()?
            .unwrap_or(false);

        let bcrypt_cost = lookup("BCRYPT_COST")
            .map(|value| {
                value.trim().parse::<u32>().map_err(|error| ConfigError::Invalid {
                    key: "BCRYPT_COST",
                    message: error.to_string(),
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_BCRYPT_COST);
        // bcrypt accepts costs from 4 to 31
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                message: format!("{bcrypt_cost} is outside 4..=31"),
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            jwt_secret,
            bind_address,
            cookie_secure,
            bcrypt_cost,
        })
    }
}
