use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings read once at startup and passed to constructors.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub user_service_url: String,
    pub user_service_timeout: Duration,
    pub payment_gateway_url: String,
    pub payment_gateway_key: String,
    pub store_buffer_size: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("user_service_url", &self.user_service_url)
            .field("user_service_timeout", &self.user_service_timeout)
            .field("payment_gateway_url", &self.payment_gateway_url)
            .field("payment_gateway_key", &"<redacted>")
            .field("store_buffer_size", &self.store_buffer_size)
            .finish()
    }
}

pub const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:8080";
pub const DEFAULT_USER_SERVICE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_PAYMENT_GATEWAY_URL: &str = "https://api.stripe.com";
pub const DEFAULT_STORE_BUFFER_SIZE: usize = 32;

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let timeout_secs = match get("USER_SERVICE_TIMEOUT_SECS") {
            Some(value) => parse_positive("USER_SERVICE_TIMEOUT_SECS", &value)?,
            None => DEFAULT_USER_SERVICE_TIMEOUT_SECS,
        };
        let store_buffer_size = match get("STORE_BUFFER_SIZE") {
            Some(value) => parse_positive("STORE_BUFFER_SIZE", &value)? as usize,
            None => DEFAULT_STORE_BUFFER_SIZE,
        };

        Ok(Self {
            user_service_url: get("USER_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_USER_SERVICE_URL.to_string()),
            user_service_timeout: Duration::from_secs(timeout_secs),
            payment_gateway_url: get("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|| DEFAULT_PAYMENT_GATEWAY_URL.to_string()),
            payment_gateway_key: get("STRIPE_SECRET_KEY")
                .ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))?,
            store_buffer_size,
        })
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid { key, value: value.to_string(), reason };
    let parsed: u64 = value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if parsed == 0 {
        return Err(invalid("must be greater than zero".into()));
    }
    Ok(parsed)
}
